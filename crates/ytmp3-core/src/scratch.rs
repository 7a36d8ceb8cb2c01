//! Scratch directory cleanup

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Removes a request's downloaded artifacts when dropped.
///
/// Every file in the scratch directory whose name starts with `<prefix>.` is
/// deleted, then the directory itself is removed if nothing else is left.
/// Failures are logged and otherwise ignored.
#[derive(Debug)]
pub struct ScratchGuard {
    dir: PathBuf,
    prefix: String,
}

impl ScratchGuard {
    pub fn new(dir: impl Into<PathBuf>, artifact_stem: &str) -> Self {
        Self {
            dir: dir.into(),
            prefix: format!("{}.", artifact_stem),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn remove_artifacts(&self) {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
            Err(e) => {
                warn!("Cleanup: cannot list {}: {}", self.dir.display(), e);
                return;
            }
        };

        for entry in entries.flatten() {
            let name = entry.file_name();
            if !name.to_string_lossy().starts_with(&self.prefix) {
                continue;
            }
            let path = entry.path();
            match fs::remove_file(&path) {
                Ok(()) => debug!("Removed temporary file {}", path.display()),
                Err(e) => warn!("Cleanup: failed to remove {}: {}", path.display(), e),
            }
        }
    }

    fn remove_dir_if_empty(&self) {
        let is_empty = match fs::read_dir(&self.dir) {
            Ok(mut entries) => entries.next().is_none(),
            Err(_) => return,
        };
        if !is_empty {
            debug!("Keeping non-empty scratch directory {}", self.dir.display());
            return;
        }
        if let Err(e) = fs::remove_dir(&self.dir) {
            warn!("Cleanup: failed to remove {}: {}", self.dir.display(), e);
        }
    }
}

impl Drop for ScratchGuard {
    fn drop(&mut self) {
        self.remove_artifacts();
        self.remove_dir_if_empty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_artifacts_and_empty_dir() {
        let root = tempfile::tempdir().unwrap();
        let scratch = root.path().join("temp");
        fs::create_dir(&scratch).unwrap();
        fs::write(scratch.join("abc.mp4"), b"video").unwrap();

        drop(ScratchGuard::new(&scratch, "abc"));

        assert!(!scratch.exists());
    }

    #[test]
    fn test_keeps_unrelated_files() {
        let root = tempfile::tempdir().unwrap();
        let scratch = root.path().join("temp");
        fs::create_dir(&scratch).unwrap();
        fs::write(scratch.join("abc.mp4"), b"video").unwrap();
        fs::write(scratch.join("abc.mp4.part"), b"partial").unwrap();
        fs::write(scratch.join("abcdef.mp4"), b"someone else").unwrap();

        drop(ScratchGuard::new(&scratch, "abc"));

        assert!(!scratch.join("abc.mp4").exists());
        assert!(!scratch.join("abc.mp4.part").exists());
        assert!(scratch.join("abcdef.mp4").exists());
    }

    #[test]
    fn test_missing_dir_is_fine() {
        let root = tempfile::tempdir().unwrap();
        let guard = ScratchGuard::new(root.path().join("never-created"), "abc");
        assert_eq!(guard.dir(), root.path().join("never-created"));
        drop(guard);
    }
}
