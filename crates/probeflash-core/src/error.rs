//! Error types for probeflash

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while selecting a programmer or flashing through it
#[derive(Debug, Error)]
pub enum FlashError {
    /// The firmware binary handed to the tool does not exist
    #[error("Binary file not found: {}", .0.display())]
    BinaryNotFound(PathBuf),

    /// The ELF image a GDB based backend needs next to the raw binary is missing
    #[error("Companion ELF image not found: {} (raw .bin files cannot be flashed over GDB)", .0.display())]
    CompanionImageMissing(PathBuf),

    /// The interface named on the command line is not registered
    #[error("Unknown interface '{name}' (available: {})", .available.join(", "))]
    UnknownInterface {
        /// Requested name
        name: String,
        /// Registered identifiers
        available: Vec<String>,
    },

    /// Auto-probing found no attached interface
    #[error("No interface found")]
    NoInterfaceFound,

    /// Auto-probing found more than one attached interface
    #[error("Multiple interfaces found: {}. Please specify '--interface=<{}>'", .0.join(", "), .0.join("|"))]
    MultipleInterfaces(Vec<String>),

    /// More than one physical probe of the same kind is attached
    #[error("More than one probe found ({}); unplug the others or select one with --serial", .0.join(", "))]
    AmbiguousProbe(Vec<String>),

    /// The external tool reported failure through its exit status
    #[error("{tool} failed ({})", describe_exit(.code))]
    ToolFailed {
        /// Executable that was launched
        tool: String,
        /// Exit code, `None` if the process was killed by a signal
        code: Option<i32>,
    },

    /// The tool output did not confirm a loaded and matching image
    #[error("Flash verification failed")]
    VerificationFailed,

    /// The external tool could not be launched at all
    #[error("Failed to launch {tool}: {source}")]
    Spawn {
        /// Executable that was launched
        tool: String,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// Listing serial ports failed
    #[error("Serial port enumeration failed: {0}")]
    PortEnumeration(String),

    /// I/O error while talking to a child process
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// Result type for probeflash operations
pub type Result<T> = std::result::Result<T, FlashError>;
