//! Programmer registry
//!
//! The set of programmers is closed and known at compile time. The registry
//! only fixes their order so auto-probing is deterministic.

use probeflash_blackmagic::BlackmagicProgrammer;
use probeflash_core::Programmer;
use probeflash_openocd::{OpenOcdProgrammer, DEFAULT_OPENOCD, INTERFACES};

/// Settings applied to every built-in programmer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// OpenOCD executable
    pub openocd: String,
    /// GDB executable used with the Black Magic Probe
    pub gdb: String,
    /// Serial number of the probe to use, if several may be attached
    pub serial: Option<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            openocd: DEFAULT_OPENOCD.to_string(),
            gdb: probeflash_blackmagic::DEFAULT_GDB.to_string(),
            serial: None,
        }
    }
}

/// Identifiers of the built-in programmers, in probe order
pub fn builtin_identifiers() -> Vec<&'static str> {
    INTERFACES
        .iter()
        .map(|i| i.name)
        .chain(std::iter::once(probeflash_blackmagic::IDENTIFIER))
        .collect()
}

/// Ordered, fixed list of programmers
pub struct ProgrammerRegistry {
    programmers: Vec<Box<dyn Programmer>>,
}

impl ProgrammerRegistry {
    /// The built-in programmers: every OpenOCD interface, then the Black
    /// Magic Probe
    pub fn builtin(config: &RegistryConfig) -> Self {
        let mut programmers: Vec<Box<dyn Programmer>> = INTERFACES
            .iter()
            .map(|interface| {
                Box::new(
                    OpenOcdProgrammer::new(*interface)
                        .with_executable(config.openocd.as_str())
                        .with_serial(config.serial.clone()),
                ) as Box<dyn Programmer>
            })
            .collect();

        programmers.push(Box::new(
            BlackmagicProgrammer::new()
                .with_gdb(config.gdb.as_str())
                .with_serial(config.serial.clone()),
        ));

        Self { programmers }
    }

    /// Registry over an explicit list of programmers
    pub fn from_programmers(programmers: Vec<Box<dyn Programmer>>) -> Self {
        Self { programmers }
    }

    /// Number of registered programmers
    pub fn len(&self) -> usize {
        self.programmers.len()
    }

    /// True if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.programmers.is_empty()
    }

    /// Identifiers in registry order
    pub fn identifiers(&self) -> Vec<String> {
        self.programmers
            .iter()
            .map(|p| p.identifier().to_string())
            .collect()
    }

    /// Iterate over the programmers in registry order
    pub fn iter(&self) -> impl Iterator<Item = &(dyn Programmer + 'static)> {
        self.programmers.iter().map(|p| p.as_ref())
    }

    /// Position of the programmer called `name`
    pub fn position(&self, name: &str) -> Option<usize> {
        self.programmers.iter().position(|p| p.identifier() == name)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut (dyn Programmer + 'static)> {
        self.programmers.get_mut(index).map(|p| p.as_mut())
    }
}
