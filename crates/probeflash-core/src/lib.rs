//! probeflash-core - shared building blocks for probeflash
//!
//! This crate defines the [`Programmer`] contract that every debug-probe
//! backend implements, the error type shared by the whole workspace, and the
//! plumbing used to launch external debugger front-ends.
//!
//! # Modules
//!
//! - [`programmer`]: the `Programmer` trait and `ProbeConfig` descriptor
//! - [`process`]: command lines, child process runner and captured output
//! - [`progress`]: deferred progress reporting while a tool runs
//! - [`error`]: `FlashError` and the `Result` alias

pub mod error;
pub mod process;
pub mod programmer;
pub mod progress;

pub use error::{FlashError, Result};
pub use process::{CommandRunner, SystemRunner, ToolCommand, ToolOutput};
pub use programmer::{require_file, ProbeConfig, Programmer};
pub use progress::{FlashProgress, NoProgress};
