//! Configuration management for ytmp3

use crate::error::ConfigError;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub paths: PathsConfig,
    pub output: OutputConfig,
    pub source: SourceConfig,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Path to yt-dlp binary (auto-detected if not set)
    pub yt_dlp: Option<PathBuf>,
    /// Path to FFmpeg binary (auto-detected if not set)
    pub ffmpeg: Option<PathBuf>,
    /// Path to ffprobe binary (auto-detected if not set)
    pub ffprobe: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Where finished MP3 files are written
    pub directory: PathBuf,
    /// Scratch directory name, nested under `directory`
    pub scratch_subdir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Substring every accepted URL must contain
    pub domain: String,
    /// Container extension of the progressive stream to download
    pub container: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Metadata resolution attempts before giving up
    pub max_attempts: u32,
    /// Backoff base; the wait after attempt `n` (0-based) is `base * 2^n`
    pub base_delay_secs: u64,
    /// Pause after every metadata call that returned
    pub throttle_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            output: OutputConfig {
                directory: PathBuf::from("saved"),
                scratch_subdir: "temp".to_string(),
            },
            source: SourceConfig {
                domain: "youtube.com".to_string(),
                container: "mp4".to_string(),
            },
            retry: RetryConfig {
                max_attempts: 3,
                base_delay_secs: 3,
                throttle_secs: 3,
            },
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(default_config) = Self::default_file() {
            if default_config.exists() {
                figment = figment.merge(Toml::file(&default_config));
            }
        }

        if let Some(path) = config_file {
            if !path.exists() {
                return Err(ConfigError::LoadError(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }

        // YTMP3_RETRY__MAX_ATTEMPTS=5 -> retry.max_attempts
        figment = figment.merge(Env::prefixed("YTMP3_").split("__"));

        let config: Config = figment
            .extract()
            .map_err(|e| ConfigError::LoadError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Per-user config file location
    pub fn default_file() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("ytmp3/config.toml"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.source.domain.trim().is_empty() {
            return Err(ConfigError::InvalidValue("source.domain is empty".to_string()));
        }
        if self.source.container.trim().is_empty() {
            return Err(ConfigError::InvalidValue("source.container is empty".to_string()));
        }
        let scratch = self.output.scratch_subdir.trim();
        if scratch.is_empty() || scratch.contains(['/', '\\']) || scratch == "." || scratch == ".." {
            return Err(ConfigError::InvalidValue(format!(
                "output.scratch_subdir must be a plain directory name, got {:?}",
                self.output.scratch_subdir
            )));
        }
        Ok(())
    }

    /// Get yt-dlp path, auto-detecting if not configured
    pub fn yt_dlp_path(&self) -> Result<PathBuf, ConfigError> {
        resolve_tool(self.paths.yt_dlp.as_ref(), "yt-dlp")
    }

    /// Get FFmpeg path, auto-detecting if not configured
    pub fn ffmpeg_path(&self) -> Result<PathBuf, ConfigError> {
        resolve_tool(self.paths.ffmpeg.as_ref(), "ffmpeg")
    }

    /// Get ffprobe path, auto-detecting if not configured
    pub fn ffprobe_path(&self) -> Result<PathBuf, ConfigError> {
        resolve_tool(self.paths.ffprobe.as_ref(), "ffprobe")
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.output.directory.join(&self.output.scratch_subdir)
    }
}

fn resolve_tool(configured: Option<&PathBuf>, name: &str) -> Result<PathBuf, ConfigError> {
    match configured {
        Some(path) => Ok(path.clone()),
        None => which::which(name)
            .map_err(|_| ConfigError::InvalidValue(format!("{} not found in PATH", name))),
    }
}
