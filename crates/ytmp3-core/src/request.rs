//! Per-invocation request and result types

use std::fmt;
use std::path::PathBuf;

/// Which end of the resolution-ordered stream list to take
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QualityPreference {
    #[default]
    Highest,
    Lowest,
}

impl QualityPreference {
    /// Interpret an interactive answer; anything but "lowest" means highest
    pub fn from_prompt(input: &str) -> Self {
        if input.trim().eq_ignore_ascii_case("lowest") {
            QualityPreference::Lowest
        } else {
            QualityPreference::Highest
        }
    }
}

impl fmt::Display for QualityPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityPreference::Highest => write!(f, "highest"),
            QualityPreference::Lowest => write!(f, "lowest"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub url: String,
    pub quality: QualityPreference,
}

impl ConversionRequest {
    pub fn new(url: impl Into<String>, quality: QualityPreference) -> Self {
        Self {
            url: url.into().trim().to_string(),
            quality,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pub output_path: PathBuf,
}

/// True for the interactive quit sentinel
pub fn is_quit(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case("q")
}
