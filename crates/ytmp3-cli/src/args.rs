use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use ytmp3_core::QualityPreference;

#[derive(Parser)]
#[command(name = "ytmp3")]
#[command(author, version, about = "Download YouTube videos and keep the audio as MP3")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Without a subcommand, ytmp3 prompts for URLs until you enter `q`
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output directory (default: saved)
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a single URL without prompting
    Convert {
        /// YouTube watch URL
        url: String,

        /// Which progressive stream to download
        #[arg(short, long, value_enum, default_value = "highest")]
        quality: Quality,
    },

    /// Check that yt-dlp, ffmpeg and ffprobe are installed
    Doctor,

    /// Show configuration
    Config,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quality {
    /// Highest-resolution progressive stream
    Highest,
    /// Lowest-resolution progressive stream (smallest download)
    Lowest,
}

impl From<Quality> for QualityPreference {
    fn from(quality: Quality) -> Self {
        match quality {
            Quality::Highest => QualityPreference::Highest,
            Quality::Lowest => QualityPreference::Lowest,
        }
    }
}
