//! Pipeline progress events and reporter seams

use std::path::PathBuf;
use std::time::Duration;

/// Pipeline progress stages
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineStage {
    Validating { url: String },
    ResolvingMetadata { attempt: u32, max_attempts: u32 },
    RetryScheduled {
        attempt: u32,
        max_attempts: u32,
        wait: Duration,
        reason: String,
    },
    SelectingStream { title: String },
    Downloading { resolution: u32, total_bytes: u64 },
    ResolvingOutputPath,
    Transcoding { output: PathBuf },
    CleaningUp,
    Complete { output: PathBuf, duration: Duration },
    Failed { stage: &'static str, error: String },
}

/// Receives byte counts while a transfer is running.
///
/// Called inline from the transfer loop, so implementations must return
/// quickly.
pub trait TransferProgress: Send + Sync {
    /// `bytes` transferred since the previous call
    fn advance(&self, bytes: u64);
    /// End of transfer; `completed` is false when it failed
    fn finish(&self, completed: bool);
}

pub trait ProgressReporter: Send + Sync {
    fn stage(&self, stage: &PipelineStage);

    /// Build the reporter for one transfer before it starts
    fn transfer(&self, total_bytes: u64) -> Box<dyn TransferProgress>;
}

/// Reporter that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl TransferProgress for NoopReporter {
    fn advance(&self, _bytes: u64) {}
    fn finish(&self, _completed: bool) {}
}

impl ProgressReporter for NoopReporter {
    fn stage(&self, _stage: &PipelineStage) {}

    fn transfer(&self, _total_bytes: u64) -> Box<dyn TransferProgress> {
        Box::new(NoopReporter)
    }
}
