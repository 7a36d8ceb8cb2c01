//! Error types for ytmp3-core

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid YouTube URL: {0}")]
    InvalidInput(String),

    #[error("Failed to fetch video metadata after {attempts} attempt(s): {reason}")]
    Resolution { attempts: u32, reason: String },

    #[error("No suitable video stream found (wanted progressive {container})")]
    NoStream { container: String },

    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("Conversion failed: {0}")]
    Transcode(#[from] TranscodeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Name of the pipeline state this failure belongs to
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::InvalidInput(_) => "validating",
            PipelineError::Resolution { .. } => "resolving metadata",
            PipelineError::NoStream { .. } => "selecting stream",
            PipelineError::Download(_) => "downloading",
            PipelineError::Io(_) => "resolving output path",
            PipelineError::Transcode(_) => "transcoding",
        }
    }
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("yt-dlp failed with exit code {code:?}: {message}")]
    YtDlpFailed { code: Option<i32>, message: String },

    #[error("Video unavailable or private: {0}")]
    VideoUnavailable(String),

    #[error("Only single videos are supported, got a {0}")]
    Unsupported(String),

    #[error("Failed to parse metadata: {0}")]
    MetadataParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("yt-dlp failed with exit code {code:?}: {message}")]
    YtDlpFailed { code: Option<i32>, message: String },

    #[error("Downloaded file missing: {0}")]
    MissingOutput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("ffprobe failed with exit code {0:?}")]
    FfprobeFailed(Option<i32>),

    #[error("Failed to parse ffprobe output: {0}")]
    ProbeParse(String),

    #[error("No audio track in {0}")]
    NoAudioTrack(String),

    #[error("FFmpeg encoding failed with exit code {code:?}: {message}")]
    FfmpegFailed { code: Option<i32>, message: String },

    #[error("Output already exists: {0}")]
    OutputExists(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadError(String),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}
