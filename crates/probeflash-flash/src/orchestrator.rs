//! Interface selection and flashing
//!
//! One flash invocation goes `Idle -> (ExplicitSelect | AutoProbe) ->
//! Flashing -> {Success, Failure}`. Probes run strictly one after another so
//! two backends never contend for the same transport.

use crate::registry::ProgrammerRegistry;
use probeflash_core::{require_file, FlashError, FlashProgress, Result};
use std::path::Path;
use std::time::{Duration, Instant};

/// Outcome of a successful flash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashReport {
    /// Identifier of the programmer that flashed
    pub programmer: String,
    /// Wall-clock time since the flash operation started
    pub elapsed: Duration,
}

/// Selects a programmer from the registry and flashes through it
pub struct Orchestrator {
    registry: ProgrammerRegistry,
}

impl Orchestrator {
    pub fn new(registry: ProgrammerRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProgrammerRegistry {
        &self.registry
    }

    /// Probe every programmer in order and return the identifiers that
    /// answered
    pub fn probe_all(&mut self) -> Result<Vec<String>> {
        let found = self.search()?;
        Ok(found
            .into_iter()
            .filter_map(|i| self.registry.iter().nth(i))
            .map(|p| p.identifier().to_string())
            .collect())
    }

    /// Flash `binary` through the named interface, or through the single
    /// interface auto-probing finds
    pub fn flash(
        &mut self,
        binary: &Path,
        interface: Option<&str>,
        progress: &mut dyn FlashProgress,
    ) -> Result<FlashReport> {
        let start = Instant::now();

        require_file(binary)?;

        let index = match interface {
            Some(name) => self.select(name)?,
            None => self.auto_select()?,
        };

        let programmer = self
            .registry
            .get_mut(index)
            .ok_or(FlashError::NoInterfaceFound)?;
        let name = programmer.identifier().to_string();

        log::info!("Flashing {} using {}", binary.display(), name);
        programmer.flash(binary, progress)?;

        let elapsed = start.elapsed();
        log::info!("Flashed successfully in {:.2}s", elapsed.as_secs_f64());

        Ok(FlashReport {
            programmer: name,
            elapsed,
        })
    }

    fn select(&self, name: &str) -> Result<usize> {
        self.registry
            .position(name)
            .ok_or_else(|| FlashError::UnknownInterface {
                name: name.to_string(),
                available: self.registry.identifiers(),
            })
    }

    fn auto_select(&mut self) -> Result<usize> {
        log::info!("Probing for interfaces...");
        let found = self.search()?;

        match found.as_slice() {
            [] => Err(FlashError::NoInterfaceFound),
            [index] => Ok(*index),
            _ => {
                let names: Vec<String> = found
                    .iter()
                    .filter_map(|i| self.registry.iter().nth(*i))
                    .map(|p| p.identifier().to_string())
                    .collect();
                Err(FlashError::MultipleInterfaces(names))
            }
        }
    }

    /// Indices of every programmer whose probe succeeded, in registry order
    fn search(&mut self) -> Result<Vec<usize>> {
        let mut found = Vec::new();

        for index in 0..self.registry.len() {
            let Some(programmer) = self.registry.get_mut(index) else {
                continue;
            };
            let name = programmer.identifier().to_string();
            log::debug!("Trying {}", name);

            if programmer.probe()? {
                log::debug!("Found {}", name);
                found.push(index);
            } else {
                log::debug!("Failed to probe {}", name);
            }
        }

        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use probeflash_core::{NoProgress, Programmer};
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::rc::Rc;

    #[derive(Default)]
    struct Calls {
        probes: Vec<String>,
        flashes: Vec<(String, PathBuf)>,
    }

    struct MockProgrammer {
        name: &'static str,
        /// `Err` holds the labels of the probes reported as ambiguous
        found: std::result::Result<bool, Vec<String>>,
        flash_ok: bool,
        calls: Rc<RefCell<Calls>>,
    }

    impl Programmer for MockProgrammer {
        fn identifier(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "mock"
        }

        fn probe(&mut self) -> Result<bool> {
            self.calls.borrow_mut().probes.push(self.name.to_string());
            self.found.clone().map_err(FlashError::AmbiguousProbe)
        }

        fn flash(&mut self, binary: &Path, _progress: &mut dyn FlashProgress) -> Result<()> {
            self.calls
                .borrow_mut()
                .flashes
                .push((self.name.to_string(), binary.to_path_buf()));
            if self.flash_ok {
                Ok(())
            } else {
                Err(FlashError::ToolFailed {
                    tool: "mock".into(),
                    code: Some(1),
                })
            }
        }
    }

    /// Registry of mocks; each entry is `(name, probes_true)`
    fn orchestrator(entries: &[(&'static str, bool)]) -> (Orchestrator, Rc<RefCell<Calls>>) {
        let calls = Rc::new(RefCell::new(Calls::default()));
        let programmers = entries
            .iter()
            .map(|&(name, found)| {
                Box::new(MockProgrammer {
                    name,
                    found: Ok(found),
                    flash_ok: true,
                    calls: Rc::clone(&calls),
                }) as Box<dyn Programmer>
            })
            .collect();
        (
            Orchestrator::new(ProgrammerRegistry::from_programmers(programmers)),
            calls,
        )
    }

    fn firmware() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("fw.bin");
        std::fs::write(&bin, [0u8; 16]).unwrap();
        (dir, bin)
    }

    const ALL: &[(&str, bool)] = &[
        ("jlink", false),
        ("cmsis-dap", false),
        ("stlink", false),
        ("blackmagic_usb", false),
    ];

    #[test]
    fn test_zero_found_never_flashes() {
        let (_dir, bin) = firmware();
        let (mut orch, calls) = orchestrator(ALL);

        let err = orch.flash(&bin, None, &mut NoProgress).unwrap_err();
        assert!(matches!(err, FlashError::NoInterfaceFound));
        assert_eq!(calls.borrow().probes.len(), 4);
        assert!(calls.borrow().flashes.is_empty());
    }

    #[test]
    fn test_single_found_flashes_once() {
        let (_dir, bin) = firmware();
        let (mut orch, calls) = orchestrator(&[
            ("jlink", false),
            ("cmsis-dap", false),
            ("stlink", true),
            ("blackmagic_usb", false),
        ]);

        let report = orch.flash(&bin, None, &mut NoProgress).unwrap();
        assert_eq!(report.programmer, "stlink");
        assert_eq!(
            calls.borrow().flashes,
            [("stlink".to_string(), bin.clone())]
        );
    }

    #[test]
    fn test_multiple_found_names_all() {
        let (_dir, bin) = firmware();
        let (mut orch, calls) = orchestrator(&[
            ("jlink", true),
            ("cmsis-dap", true),
            ("stlink", false),
        ]);

        let err = orch.flash(&bin, None, &mut NoProgress).unwrap_err();
        match &err {
            FlashError::MultipleInterfaces(names) => assert_eq!(names, &["jlink", "cmsis-dap"]),
            other => panic!("unexpected error: {:?}", other),
        }
        let msg = err.to_string();
        assert!(msg.contains("jlink") && msg.contains("cmsis-dap"));
        assert!(calls.borrow().flashes.is_empty());
    }

    #[test]
    fn test_probes_run_in_registry_order() {
        let (mut orch, calls) = orchestrator(ALL);
        assert!(orch.probe_all().unwrap().is_empty());
        assert_eq!(
            calls.borrow().probes,
            ["jlink", "cmsis-dap", "stlink", "blackmagic_usb"]
        );
    }

    #[test]
    fn test_explicit_interface_skips_probing() {
        let (_dir, bin) = firmware();
        let (mut orch, calls) = orchestrator(ALL);

        let report = orch.flash(&bin, Some("cmsis-dap"), &mut NoProgress).unwrap();
        assert_eq!(report.programmer, "cmsis-dap");
        assert!(calls.borrow().probes.is_empty());
        assert_eq!(calls.borrow().flashes.len(), 1);
    }

    #[test]
    fn test_unknown_interface() {
        let (_dir, bin) = firmware();
        let (mut orch, calls) = orchestrator(ALL);

        let err = orch.flash(&bin, Some("xds110"), &mut NoProgress).unwrap_err();
        match err {
            FlashError::UnknownInterface { name, available } => {
                assert_eq!(name, "xds110");
                assert_eq!(available.len(), 4);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(calls.borrow().flashes.is_empty());
    }

    #[test]
    fn test_missing_binary_probes_nothing() {
        let (mut orch, calls) = orchestrator(&[("stlink", true)]);

        let err = orch
            .flash(Path::new("/nonexistent/fw.bin"), None, &mut NoProgress)
            .unwrap_err();
        assert!(matches!(err, FlashError::BinaryNotFound(_)));
        assert!(calls.borrow().probes.is_empty());
        assert!(calls.borrow().flashes.is_empty());
    }

    #[test]
    fn test_probe_error_aborts() {
        let (_dir, bin) = firmware();
        let calls = Rc::new(RefCell::new(Calls::default()));
        let programmers: Vec<Box<dyn Programmer>> = vec![
            Box::new(MockProgrammer {
                name: "stlink",
                found: Ok(true),
                flash_ok: true,
                calls: Rc::clone(&calls),
            }),
            Box::new(MockProgrammer {
                name: "blackmagic_usb",
                found: Err(vec!["/dev/ttyACM0".into(), "/dev/ttyACM2".into()]),
                flash_ok: true,
                calls: Rc::clone(&calls),
            }),
        ];
        let mut orch = Orchestrator::new(ProgrammerRegistry::from_programmers(programmers));

        let err = orch.flash(&bin, None, &mut NoProgress).unwrap_err();
        match err {
            FlashError::AmbiguousProbe(devices) => {
                assert_eq!(devices, ["/dev/ttyACM0", "/dev/ttyACM2"])
            }
            other => panic!("expected ambiguity, got {:?}", other),
        }
        assert!(calls.borrow().flashes.is_empty());
    }

    #[test]
    fn test_flash_failure_propagates() {
        let (_dir, bin) = firmware();
        let calls = Rc::new(RefCell::new(Calls::default()));
        let programmers: Vec<Box<dyn Programmer>> = vec![Box::new(MockProgrammer {
            name: "jlink",
            found: Ok(true),
            flash_ok: false,
            calls: Rc::clone(&calls),
        })];
        let mut orch = Orchestrator::new(ProgrammerRegistry::from_programmers(programmers));

        assert!(orch.flash(&bin, None, &mut NoProgress).is_err());
        assert_eq!(calls.borrow().flashes.len(), 1);
    }
}
