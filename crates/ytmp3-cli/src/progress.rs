//! Console rendering of pipeline progress

use indicatif::{ProgressBar, ProgressStyle};
use ytmp3_core::progress::{PipelineStage, ProgressReporter, TransferProgress};

/// Prints stage changes and draws a byte progress bar while downloading
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }
}

impl ProgressReporter for ConsoleReporter {
    fn stage(&self, stage: &PipelineStage) {
        match stage {
            PipelineStage::RetryScheduled {
                attempt,
                max_attempts,
                wait,
                reason,
            } => {
                println!("\nAttempt {}/{} failed: {}", attempt, max_attempts, reason);
                println!("Waiting {} seconds before retry...", wait.as_secs());
            }
            PipelineStage::SelectingStream { title } => {
                println!("\nPreparing to download: {}", title);
            }
            PipelineStage::Transcoding { .. } => {
                println!("\nConverting to MP3...");
            }
            PipelineStage::Complete { output, duration } => {
                println!(
                    "\nSuccessfully converted to MP3: {} ({:.1}s)",
                    output.display(),
                    duration.as_secs_f32()
                );
            }
            PipelineStage::Failed { stage, error } => {
                eprintln!("\nAn error occurred while {}: {}", stage, error);
            }
            PipelineStage::Validating { .. }
            | PipelineStage::ResolvingMetadata { .. }
            | PipelineStage::Downloading { .. }
            | PipelineStage::ResolvingOutputPath
            | PipelineStage::CleaningUp => {}
        }
    }

    fn transfer(&self, total_bytes: u64) -> Box<dyn TransferProgress> {
        Box::new(DownloadBar::new(total_bytes))
    }
}

struct DownloadBar(ProgressBar);

impl DownloadBar {
    fn new(total_bytes: u64) -> Self {
        let (bar, template) = if total_bytes > 0 {
            (
                ProgressBar::new(total_bytes),
                "Downloading {bar:40.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
            )
        } else {
            (
                ProgressBar::new_spinner(),
                "{spinner:.cyan} Downloading {bytes} ({bytes_per_sec})",
            )
        };
        if let Ok(style) = ProgressStyle::with_template(template) {
            bar.set_style(style.progress_chars("=>-"));
        }
        Self(bar)
    }
}

impl TransferProgress for DownloadBar {
    fn advance(&self, bytes: u64) {
        self.0.inc(bytes);
    }

    fn finish(&self, completed: bool) {
        if completed {
            self.0.finish();
        } else {
            self.0.abandon_with_message("Download failed");
        }
    }
}
