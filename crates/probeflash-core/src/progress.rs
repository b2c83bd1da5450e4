//! Progress reporting while an external tool runs
//!
//! Backends block on the child process and call [`FlashProgress::start`]
//! before and [`FlashProgress::finish`] after. How (and whether) progress is
//! animated in between is up to the implementation.

/// Progress callback trait for long-running tool invocations
pub trait FlashProgress {
    /// Called right before the tool is launched
    fn start(&mut self, message: &str);

    /// Called once the tool has exited (or failed to launch)
    fn finish(&mut self, success: bool);
}

/// Progress reporter that does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl FlashProgress for NoProgress {
    fn start(&mut self, _message: &str) {}
    fn finish(&mut self, _success: bool) {}
}
