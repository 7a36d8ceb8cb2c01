use anyhow::Result;
use std::path::Path;
use ytmp3_core::{ConversionRequest, QualityPreference};

use super::build_pipeline;

pub async fn run(
    url: &str,
    quality: QualityPreference,
    output: Option<&Path>,
    config_path: Option<&Path>,
) -> Result<()> {
    let pipeline = build_pipeline(output, config_path)?;
    let request = ConversionRequest::new(url, quality);

    // The reporter has already printed the outcome
    let result = pipeline.convert(&request).await?;
    tracing::debug!("Wrote {}", result.output_path.display());
    Ok(())
}
