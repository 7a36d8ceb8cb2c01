//! Audio extraction using ffprobe and FFmpeg

use crate::error::TranscodeError;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// An opened media container with a known audio track
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInput {
    pub path: PathBuf,
    pub audio: AudioTrack,
    /// Container duration in seconds, when reported
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTrack {
    pub index: u32,
    pub codec: String,
    pub sample_rate: Option<u32>,
    pub channels: Option<u8>,
}

#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Open a downloaded container and locate its audio track
    async fn open(&self, video: &Path) -> Result<MediaInput, TranscodeError>;

    /// Encode the audio track of `input` to `destination`
    async fn write_audio(&self, input: &MediaInput, destination: &Path) -> Result<(), TranscodeError>;
}

#[derive(Debug)]
pub struct FfmpegTranscoder {
    ffmpeg_path: PathBuf,
    ffprobe_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    #[serde(default)]
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    index: u32,
    #[serde(default)]
    codec_name: Option<String>,
    #[serde(default)]
    sample_rate: Option<String>,
    #[serde(default)]
    channels: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    #[serde(default)]
    duration: Option<String>,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg_path: PathBuf, ffprobe_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
        }
    }

    fn mp3_codec_args() -> [&'static str; 4] {
        [
            "-c:a", "libmp3lame",
            "-q:a", "0", // VBR highest quality (~245 kbps)
        ]
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn open(&self, video: &Path) -> Result<MediaInput, TranscodeError> {
        debug!("Probing {}", video.display());

        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v", "error",
                "-select_streams", "a",
                "-show_entries", "stream=index,codec_name,sample_rate,channels:format=duration",
                "-of", "json",
            ])
            .arg(video)
            .output()
            .await?;

        if !output.status.success() {
            debug!("ffprobe stderr: {}", String::from_utf8_lossy(&output.stderr));
            return Err(TranscodeError::FfprobeFailed(output.status.code()));
        }

        parse_probe(&output.stdout, video)
    }

    async fn write_audio(&self, input: &MediaInput, destination: &Path) -> Result<(), TranscodeError> {
        info!(
            "Encoding {} audio from {} to MP3",
            input.audio.codec,
            input.path.display()
        );
        debug!(
            "Source audio: {} Hz, {} channel(s), {:.1}s",
            input.audio.sample_rate.map_or("?".to_string(), |r| r.to_string()),
            input.audio.channels.map_or("?".to_string(), |c| c.to_string()),
            input.duration.unwrap_or_default()
        );

        if destination.exists() {
            return Err(TranscodeError::OutputExists(destination.display().to_string()));
        }

        let mut cmd = Command::new(&self.ffmpeg_path);
        // -n: never overwrite an existing file
        cmd.args(["-hide_banner", "-loglevel", "error", "-n"]);
        cmd.arg("-i").arg(&input.path);
        cmd.arg("-map").arg(format!("0:{}", input.audio.index));
        cmd.arg("-vn");
        cmd.args(Self::mp3_codec_args());
        cmd.arg(destination);

        let output = cmd.output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TranscodeError::FfmpegFailed {
                code: output.status.code(),
                message: stderr.trim().to_string(),
            });
        }

        debug!("Encoded to: {}", destination.display());
        Ok(())
    }
}

fn parse_probe(json: &[u8], video: &Path) -> Result<MediaInput, TranscodeError> {
    let probe: ProbeOutput =
        serde_json::from_slice(json).map_err(|e| TranscodeError::ProbeParse(e.to_string()))?;

    let stream = probe
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| TranscodeError::NoAudioTrack(video.display().to_string()))?;

    Ok(MediaInput {
        path: video.to_path_buf(),
        audio: AudioTrack {
            index: stream.index,
            codec: stream.codec_name.unwrap_or_else(|| "unknown".to_string()),
            sample_rate: stream.sample_rate.and_then(|r| r.parse().ok()),
            channels: stream.channels,
        },
        duration: probe
            .format
            .and_then(|f| f.duration)
            .and_then(|d| d.parse().ok()),
    })
}
