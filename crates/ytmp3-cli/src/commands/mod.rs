pub mod config;
pub mod convert;
pub mod doctor;
pub mod interactive;

use anyhow::{Context, Result};
use std::path::Path;
use ytmp3_core::{
    transcoder::FfmpegTranscoder, ytdlp::YtDlpSource, Config, ConversionPipeline,
    PipelineSettings,
};

use crate::progress::ConsoleReporter;

pub type Pipeline = ConversionPipeline<YtDlpSource, FfmpegTranscoder>;

/// Load configuration, apply the `--output` override and wire up the external tools
pub fn build_pipeline(output: Option<&Path>, config_path: Option<&Path>) -> Result<Pipeline> {
    let mut config = Config::load(config_path)?;
    if let Some(dir) = output {
        config.output.directory = dir.to_path_buf();
    }

    let yt_dlp = config
        .yt_dlp_path()
        .context("yt-dlp is required; run `ytmp3 doctor`")?;
    let ffmpeg = config
        .ffmpeg_path()
        .context("ffmpeg is required; run `ytmp3 doctor`")?;
    let ffprobe = config
        .ffprobe_path()
        .context("ffprobe is required; run `ytmp3 doctor`")?;

    Ok(ConversionPipeline::new(
        YtDlpSource::new(yt_dlp),
        FfmpegTranscoder::new(ffmpeg, ffprobe),
        PipelineSettings::from_config(&config),
        Box::new(ConsoleReporter::new()),
    ))
}
