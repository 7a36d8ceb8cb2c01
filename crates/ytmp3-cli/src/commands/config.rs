use anyhow::{Context, Result};
use std::path::Path;
use ytmp3_core::config::Config;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;

    println!("ytmp3 configuration\n");
    let rendered = toml::to_string_pretty(&config).context("Failed to render configuration")?;
    println!("{}", rendered.trim_end());

    if config.paths.yt_dlp.is_none() || config.paths.ffmpeg.is_none() || config.paths.ffprobe.is_none() {
        println!("\n# Unset [paths] entries are auto-detected on PATH");
    }

    // Show config file locations
    println!("\nConfig sources (later entries win):");
    println!("  1. Built-in defaults");
    if let Some(default_file) = Config::default_file() {
        let marker = if default_file.exists() { "" } else { " (not present)" };
        println!("  2. {}{}", default_file.display(), marker);
    }
    if let Some(p) = config_path {
        println!("  3. {} (specified)", p.display());
    }
    println!("  4. Environment variables (YTMP3_*, nested keys joined with __)");

    Ok(())
}
