//! Black Magic Probe support for probeflash
//!
//! The Black Magic Probe runs a GDB server on the probe itself and exposes it
//! as a USB CDC serial port. Detection enumerates serial ports and matches the
//! probe's USB signature; flashing drives `arm-none-eabi-gdb` against that
//! port and checks GDB's output for a loaded and matching image.

mod ports;
mod programmer;

pub use ports::{
    find_devices, PortEnumerator, ProbeDevice, SystemPorts, UsbDevice, UsbSerialPort, BLACKMAGIC,
};
pub use programmer::{
    verify_output, BlackmagicProgrammer, DEFAULT_GDB, IDENTIFIER, LOAD_MARKER, MISMATCH_MARKER,
};
