//! High-level detect-then-flash orchestration
//!
//! The CLI only talks to this crate: it builds a [`ProgrammerRegistry`] from
//! its configuration and hands it to an [`Orchestrator`], which either picks
//! the interface the operator named or probes every registered programmer
//! and refuses to guess when more than one answers.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                 CLI (bin/probeflash)                 │
//! └──────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌──────────────────────────────────────────────────────┐
//! │            probeflash-flash (this crate)             │
//! │  - ProgrammerRegistry: fixed list of programmers     │
//! │  - Orchestrator: select / auto-probe, then flash     │
//! └──────────────────────────────────────────────────────┘
//!                            │
//!            ┌───────────────┴───────────────┐
//!            ▼                               ▼
//! ┌──────────────────────┐       ┌──────────────────────┐
//! │  probeflash-openocd  │       │ probeflash-blackmagic│
//! │  jlink, cmsis-dap,   │       │  blackmagic_usb      │
//! │  stlink              │       │                      │
//! └──────────────────────┘       └──────────────────────┘
//! ```

mod orchestrator;
mod registry;

pub use orchestrator::{FlashReport, Orchestrator};
pub use registry::{builtin_identifiers, ProgrammerRegistry, RegistryConfig};

pub use probeflash_blackmagic::DEFAULT_GDB;
pub use probeflash_core::{FlashError, FlashProgress, NoProgress, Programmer, Result};
pub use probeflash_openocd::DEFAULT_OPENOCD;
