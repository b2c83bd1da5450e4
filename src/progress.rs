//! Progress reporting using indicatif spinners

use indicatif::{ProgressBar, ProgressStyle};
use probeflash_flash::FlashProgress;
use std::time::Duration;

/// Spinner tick interval while a tool runs
const TICK: Duration = Duration::from_millis(250);

/// Create a standard spinner style
fn create_spinner_style() -> Result<ProgressStyle, Box<dyn std::error::Error>> {
    Ok(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?)
}

/// Progress reporter using an indicatif spinner.
///
/// The spinner ticks on its own timer, so the caller can block on the child
/// process without polling.
pub struct IndicatifProgress {
    current: Option<ProgressBar>,
}

impl IndicatifProgress {
    pub fn new() -> Self {
        Self { current: None }
    }
}

impl Default for IndicatifProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl FlashProgress for IndicatifProgress {
    fn start(&mut self, message: &str) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(create_spinner_style().unwrap_or_else(|_| ProgressStyle::default_spinner()));
        pb.set_message(message.to_string());
        pb.enable_steady_tick(TICK);
        self.current = Some(pb);
    }

    fn finish(&mut self, success: bool) {
        if let Some(pb) = self.current.take() {
            if success {
                pb.finish_with_message("done");
            } else {
                pb.abandon_with_message("failed");
            }
        }
    }
}

impl Drop for IndicatifProgress {
    fn drop(&mut self) {
        if let Some(pb) = self.current.take() {
            pb.finish_and_clear();
        }
    }
}
