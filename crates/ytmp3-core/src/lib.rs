//! ytmp3-core: fetch a YouTube video and keep only its audio as MP3

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod request;
pub mod retry;
pub mod scratch;
pub mod source;
pub mod transcoder;
pub mod ytdlp;

pub use config::Config;
pub use error::{PipelineError, Result};
pub use pipeline::{ConversionPipeline, PipelineSettings};
pub use request::{ConversionRequest, ConversionResult, QualityPreference};
