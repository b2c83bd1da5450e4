//! Flash command implementation

use probeflash_flash::{FlashProgress, FlashReport, Orchestrator};
use std::path::Path;

/// Flash `binary`, through `interface` if given or the single probe found
pub fn run_flash(
    orchestrator: &mut Orchestrator,
    binary: &Path,
    interface: Option<&str>,
    progress: &mut dyn FlashProgress,
) -> Result<FlashReport, Box<dyn std::error::Error>> {
    Ok(orchestrator.flash(binary, interface, progress)?)
}
