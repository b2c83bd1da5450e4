//! Programmer contract
//!
//! Every debug-probe backend implements [`Programmer`]. The orchestrator only
//! ever talks to backends through this trait, so adding a probe family means
//! adding one implementation and one registry entry.

use crate::error::{FlashError, Result};
use crate::progress::FlashProgress;
use std::path::Path;

/// Immutable description of one OpenOCD driven probe family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Unique identifier, used for `--interface` selection
    pub name: &'static str,
    /// Short human readable description
    pub description: &'static str,
    /// OpenOCD interface profile (e.g. `interface/jlink.cfg`)
    pub profile_file: &'static str,
    /// OpenOCD command that pins a unit by serial number (e.g. `jlink_serial`)
    pub serial_command: &'static str,
    /// Commands run after the interface profile and before the target profile
    pub extra_init: &'static [&'static str],
}

/// A debug-probe backend able to detect its hardware and flash through it
pub trait Programmer {
    /// Stable identifier, unique across the registry
    fn identifier(&self) -> &str;

    /// Short description for listings
    fn description(&self) -> &str;

    /// Check whether this backend's hardware is reachable.
    ///
    /// Never touches the target's flash. Returns `Ok(false)` when the probe
    /// is absent or detection fails; `Err` is reserved for conditions that
    /// must stop auto-detection, such as several identical probes attached.
    fn probe(&mut self) -> Result<bool>;

    /// Write `binary` to the target and verify it.
    ///
    /// On failure the captured output of the underlying tool has already
    /// been logged at error level when this returns.
    fn flash(&mut self, binary: &Path, progress: &mut dyn FlashProgress) -> Result<()>;
}

/// Fail with [`FlashError::BinaryNotFound`] unless `path` exists
pub fn require_file(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(FlashError::BinaryNotFound(path.to_path_buf()))
    }
}
