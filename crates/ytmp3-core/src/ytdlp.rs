//! Video source backed by yt-dlp

use crate::error::{DownloadError, SourceError};
use crate::progress::TransferProgress;
use crate::source::{StreamDescriptor, VideoHandle, VideoSource};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

const PROGRESS_PREFIX: &str = "YTMP3_PROGRESS";

#[derive(Debug)]
pub struct YtDlpSource {
    yt_dlp_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, rename = "_type")]
    kind: Option<String>,
    #[serde(default)]
    webpage_url: Option<String>,
    #[serde(default)]
    formats: Vec<YtDlpFormat>,
}

#[derive(Debug, Deserialize)]
struct YtDlpFormat {
    format_id: String,
    #[serde(default)]
    ext: String,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    vcodec: Option<String>,
    #[serde(default)]
    acodec: Option<String>,
    #[serde(default)]
    filesize: Option<u64>,
    #[serde(default)]
    filesize_approx: Option<u64>,
}

impl YtDlpFormat {
    fn into_descriptor(self) -> StreamDescriptor {
        let has = |codec: &Option<String>| codec.as_deref().is_some_and(|c| c != "none");
        StreamDescriptor {
            is_progressive: has(&self.vcodec) && has(&self.acodec),
            resolution: self.height.unwrap_or(0),
            size_bytes: self.filesize.or(self.filesize_approx).unwrap_or(0),
            container_extension: self.ext,
            format_id: self.format_id,
        }
    }
}

impl YtDlpSource {
    pub fn new(yt_dlp_path: PathBuf) -> Self {
        Self { yt_dlp_path }
    }
}

#[async_trait]
impl VideoSource for YtDlpSource {
    async fn resolve(&self, url: &str) -> Result<VideoHandle, SourceError> {
        info!("Fetching metadata for: {}", url);

        let output = Command::new(&self.yt_dlp_path)
            .args(["-J", "--no-playlist", "--skip-download", "--no-warnings"])
            .arg(url)
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("yt-dlp stderr: {}", stderr);

            if stderr.contains("Video unavailable") || stderr.contains("Private video") {
                return Err(SourceError::VideoUnavailable(url.to_string()));
            }
            return Err(SourceError::YtDlpFailed {
                code: output.status.code(),
                message: last_line(&stderr),
            });
        }

        parse_info(&output.stdout, url)
    }

    async fn download(
        &self,
        video: &VideoHandle,
        stream: &StreamDescriptor,
        destination_dir: &Path,
        progress: &dyn TransferProgress,
    ) -> Result<PathBuf, DownloadError> {
        let destination = destination_dir.join(video.artifact_name(stream));
        info!(
            "Downloading format {} ({}p) to {}",
            stream.format_id,
            stream.resolution,
            destination.display()
        );

        let template = format!(
            "download:{} %(progress.downloaded_bytes)s %(progress.total_bytes)s",
            PROGRESS_PREFIX
        );

        let mut child = Command::new(&self.yt_dlp_path)
            .arg("-f")
            .arg(&stream.format_id)
            .args([
                "--no-playlist",
                "--no-warnings",
                // No partial files and no resuming
                "--no-part",
                "--no-continue",
                "--newline",
            ])
            .arg("--progress-template")
            .arg(&template)
            .arg("-o")
            .arg(&destination)
            .arg(&video.page_url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child.stdout.take().ok_or_else(|| {
            DownloadError::Io(std::io::Error::other("yt-dlp stdout not captured"))
        })?;
        let mut stderr = child.stderr.take().ok_or_else(|| {
            DownloadError::Io(std::io::Error::other("yt-dlp stderr not captured"))
        })?;

        let report = async {
            let mut lines = BufReader::new(stdout).lines();
            let mut reported = 0u64;
            while let Some(line) = lines.next_line().await? {
                if let Some(done) = parse_progress_line(&line) {
                    if done > reported {
                        progress.advance(done - reported);
                        reported = done;
                    }
                }
            }
            Ok::<_, std::io::Error>(())
        };
        let drain_stderr = async {
            let mut text = String::new();
            stderr.read_to_string(&mut text).await.map(|_| text)
        };

        let (report_result, stderr_text) = tokio::join!(report, drain_stderr);
        let status = child.wait().await?;
        report_result?;
        let stderr_text = stderr_text.unwrap_or_default();

        if !status.success() {
            debug!("yt-dlp stderr: {}", stderr_text);
            return Err(DownloadError::YtDlpFailed {
                code: status.code(),
                message: last_line(&stderr_text),
            });
        }

        if !destination.exists() {
            return Err(DownloadError::MissingOutput(destination.display().to_string()));
        }

        debug!("Downloaded: {}", destination.display());
        Ok(destination)
    }
}

fn parse_info(json: &[u8], url: &str) -> Result<VideoHandle, SourceError> {
    let info: YtDlpInfo =
        serde_json::from_slice(json).map_err(|e| SourceError::MetadataParse(e.to_string()))?;

    if let Some(kind) = info.kind.as_deref() {
        if kind != "video" {
            return Err(SourceError::Unsupported(kind.to_string()));
        }
    }

    debug!("Resolved {} with {} formats", info.id, info.formats.len());

    Ok(VideoHandle {
        page_url: info.webpage_url.unwrap_or_else(|| url.to_string()),
        streams: info
            .formats
            .into_iter()
            .map(YtDlpFormat::into_descriptor)
            .collect(),
        id: info.id,
        title: info.title,
    })
}

/// Cumulative downloaded bytes from one of our progress-template lines
fn parse_progress_line(line: &str) -> Option<u64> {
    let mut fields = line.split_whitespace();
    if fields.next()? != PROGRESS_PREFIX {
        return None;
    }
    fields.next()?.parse().ok()
}

fn last_line(stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("no output")
        .trim()
        .to_string()
}
