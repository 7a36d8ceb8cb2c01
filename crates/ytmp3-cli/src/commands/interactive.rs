use anyhow::Result;
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use ytmp3_core::request::is_quit;
use ytmp3_core::{ConversionRequest, QualityPreference};

use super::build_pipeline;

/// Prompt for URLs until `q` or end of input; failures never end the loop
pub async fn run(output: Option<&Path>, config_path: Option<&Path>) -> Result<()> {
    let pipeline = build_pipeline(output, config_path)?;
    println!(
        "Saving MP3 files to {}",
        pipeline.settings().output_dir.display()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt("\nEnter YouTube URL (or 'q' to quit): ")?;
        let Some(url) = lines.next_line().await? else {
            break;
        };
        if is_quit(&url) {
            break;
        }

        prompt("Select quality (highest/lowest) [default: highest]: ")?;
        let quality = lines
            .next_line()
            .await?
            .map(|answer| QualityPreference::from_prompt(&answer))
            .unwrap_or_default();

        let request = ConversionRequest::new(url, quality);
        if let Err(e) = pipeline.convert(&request).await {
            debug!("Request failed while {}: {}", e.stage(), e);
        }
    }

    Ok(())
}

fn prompt(text: &str) -> std::io::Result<()> {
    print!("{}", text);
    std::io::stdout().flush()
}
