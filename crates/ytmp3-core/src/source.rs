//! Remote video source model: URL checks, resolved handles and stream selection

use crate::error::{DownloadError, PipelineError, SourceError};
use crate::progress::TransferProgress;
use crate::request::QualityPreference;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use url::Url;

/// One downloadable stream of a video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDescriptor {
    pub format_id: String,
    /// Vertical resolution in pixels, 0 when unknown
    pub resolution: u32,
    pub container_extension: String,
    /// Single file carrying both audio and video
    pub is_progressive: bool,
    /// Declared size, 0 when unknown
    pub size_bytes: u64,
}

/// A resolved video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoHandle {
    pub id: String,
    pub title: Option<String>,
    /// URL the transfer is started from
    pub page_url: String,
    pub streams: Vec<StreamDescriptor>,
}

impl VideoHandle {
    /// The title, if present and non-empty
    pub fn usable_title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.is_empty())
    }

    /// Streams matching the filter, ordered by resolution ascending
    pub fn streams_matching(&self, progressive: bool, extension: &str) -> Vec<&StreamDescriptor> {
        let mut matching: Vec<&StreamDescriptor> = self
            .streams
            .iter()
            .filter(|s| s.is_progressive == progressive)
            .filter(|s| s.container_extension.eq_ignore_ascii_case(extension))
            .collect();
        matching.sort_by_key(|s| s.resolution);
        matching
    }

    /// Pick one progressive stream with the given container
    pub fn select_stream(
        &self,
        container: &str,
        quality: QualityPreference,
    ) -> Option<&StreamDescriptor> {
        let candidates = self.streams_matching(true, container);
        match quality {
            QualityPreference::Lowest => candidates.first().copied(),
            QualityPreference::Highest => candidates.last().copied(),
        }
    }

    /// File name the transfer of `stream` is written to inside the scratch directory
    pub fn artifact_name(&self, stream: &StreamDescriptor) -> String {
        format!("{}.{}", self.id, stream.container_extension)
    }
}

#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Resolve a URL into metadata and available streams
    async fn resolve(&self, url: &str) -> Result<VideoHandle, SourceError>;

    /// Transfer `stream` into `destination_dir`, returning the written file
    async fn download(
        &self,
        video: &VideoHandle,
        stream: &StreamDescriptor,
        destination_dir: &Path,
        progress: &dyn TransferProgress,
    ) -> Result<PathBuf, DownloadError>;
}

/// Check URL syntax and that it belongs to `domain`
pub fn validate_url(url: &str, domain: &str) -> Result<(), PipelineError> {
    let parsed = Url::parse(url)
        .map_err(|e| PipelineError::InvalidInput(format!("{}: {}", url, e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(PipelineError::InvalidInput(format!(
            "{}: unsupported scheme {}",
            url,
            parsed.scheme()
        )));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(PipelineError::InvalidInput(format!("{}: missing host", url)));
    }
    if !url.contains(domain) {
        return Err(PipelineError::InvalidInput(format!("{}: not a {} URL", url, domain)));
    }
    Ok(())
}

/// Build `video_<id>` from the `watch?v=<id>` part of the URL.
///
/// Only the `watch?v=` shape is understood; anything else is rejected.
pub fn fallback_title(url: &str) -> Result<String, PipelineError> {
    let id = url
        .split_once("watch?v=")
        .map(|(_, rest)| rest.split('&').next().unwrap_or(rest))
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            PipelineError::InvalidInput(format!("{}: expected a watch?v=<id> URL", url))
        })?;
    Ok(format!("video_{}", id))
}
