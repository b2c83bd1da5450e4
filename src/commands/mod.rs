//! CLI command implementations
//!
//! Each command works on an [`Orchestrator`](probeflash_flash::Orchestrator)
//! built from the CLI configuration, so tests can hand in a registry of
//! scripted programmers instead of real probes.

mod flash;
mod list;
mod probe;

pub use flash::run_flash;
pub use list::list_interfaces;
pub use probe::run_probe;

/// Process exit status for a command result
pub fn exit_status<T>(result: &Result<T, Box<dyn std::error::Error>>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}
