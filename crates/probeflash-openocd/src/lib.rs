//! OpenOCD backed programmers for probeflash
//!
//! Each supported probe family (J-Link, CMSIS-DAP, ST-Link) is described by a
//! static [`ProbeConfig`](probeflash_core::ProbeConfig) in [`INTERFACES`] and
//! driven through the same [`OpenOcdProgrammer`].

mod interfaces;
mod programmer;

pub use interfaces::{find_interface, CMSIS_DAP, INTERFACES, JLINK, STLINK};
pub use programmer::{OpenOcdProgrammer, DEFAULT_OPENOCD, FLASH_BASE, TARGET_CONFIG};
