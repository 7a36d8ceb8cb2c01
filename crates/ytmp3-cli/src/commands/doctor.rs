use anyhow::Result;
use regex::Regex;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use ytmp3_core::config::Config;
use ytmp3_core::error::ConfigError;

struct Tool {
    name: &'static str,
    locate: fn(&Config) -> Result<PathBuf, ConfigError>,
    version_flag: &'static str,
    install_hint: &'static str,
}

const TOOLS: [Tool; 3] = [
    Tool {
        name: "yt-dlp",
        locate: Config::yt_dlp_path,
        version_flag: "--version",
        install_hint: "brew install yt-dlp  (or: pip install yt-dlp)",
    },
    Tool {
        name: "ffmpeg",
        locate: Config::ffmpeg_path,
        version_flag: "-version",
        install_hint: "brew install ffmpeg",
    },
    Tool {
        name: "ffprobe",
        locate: Config::ffprobe_path,
        version_flag: "-version",
        install_hint: "ships with ffmpeg: brew install ffmpeg",
    },
];

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;

    println!("ytmp3 dependency check\n");

    let mut all_ok = true;
    for tool in &TOOLS {
        all_ok &= check(tool, (tool.locate)(&config)).await;
    }

    println!();
    if all_ok {
        println!("All dependencies OK!");
    } else {
        println!("Some dependencies are missing. See above for installation instructions.");
    }

    Ok(())
}

async fn check(tool: &Tool, located: Result<PathBuf, ConfigError>) -> bool {
    print!("{:<9} ", format!("{}:", tool.name));

    let path = match located {
        Ok(path) => path,
        Err(_) => {
            println!("NOT FOUND");
            println!("          Install with: {}", tool.install_hint);
            return false;
        }
    };

    match Command::new(&path).arg(tool.version_flag).output().await {
        Ok(out) if out.status.success() => {
            let stdout = String::from_utf8_lossy(&out.stdout);
            println!("OK ({}, {})", parse_version(&stdout), path.display());
            true
        }
        _ => {
            println!("FOUND at {} but failed to get version", path.display());
            false
        }
    }
}

/// Version from `yt-dlp --version` or the first line of `ffmpeg -version`
fn parse_version(output: &str) -> String {
    let first_line = output.lines().next().unwrap_or("").trim();
    Regex::new(r"version\s+(\S+)")
        .ok()
        .and_then(|re| re.captures(first_line))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| {
            if first_line.is_empty() {
                "unknown".to_string()
            } else {
                first_line.to_string()
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version() {
        assert_eq!(
            parse_version("ffmpeg version 6.1.1 Copyright (c) 2000-2023 the FFmpeg developers\nbuilt with"),
            "6.1.1"
        );
        assert_eq!(
            parse_version("ffprobe version n7.0-static https://johnvansickle.com/ffmpeg/"),
            "n7.0-static"
        );
        assert_eq!(parse_version("2024.08.06\n"), "2024.08.06");
        assert_eq!(parse_version(""), "unknown");
    }
}
