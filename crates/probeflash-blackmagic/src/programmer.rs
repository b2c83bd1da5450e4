//! Black Magic Probe programmer implementation

use crate::ports::{find_devices, PortEnumerator, SystemPorts};
use probeflash_core::{
    require_file, CommandRunner, FlashError, FlashProgress, Programmer, Result, SystemRunner,
    ToolCommand,
};
use std::path::{Path, PathBuf};

/// Registry identifier
pub const IDENTIFIER: &str = "blackmagic_usb";

/// Executable launched when no override is configured
pub const DEFAULT_GDB: &str = "arm-none-eabi-gdb";

/// Printed by `load` once it starts writing the code section
pub const LOAD_MARKER: &str = "Loading section .text,";

/// Printed by `compare-sections` for a section that differs from the image
pub const MISMATCH_MARKER: &str = "MIS-MATCHED!";

/// GDB commands, in order, after `target extended-remote <port>`
const SESSION: &[&str] = &[
    "set confirm off",
    "monitor swdp_scan",
    "attach 1",
    "set mem inaccessible-by-default off",
    "load",
    "compare-sections",
    "quit",
];

/// True if GDB output shows the image was loaded and every section matched
pub fn verify_output(output: &str) -> bool {
    output.contains(LOAD_MARKER) && !output.contains(MISMATCH_MARKER)
}

/// Programmer that flashes through a Black Magic Probe's GDB server
pub struct BlackmagicProgrammer {
    port: Option<String>,
    gdb: String,
    serial: Option<String>,
    runner: Box<dyn CommandRunner>,
    ports: Box<dyn PortEnumerator>,
}

impl BlackmagicProgrammer {
    /// Create a programmer using the system GDB and serial port list
    pub fn new() -> Self {
        Self {
            port: None,
            gdb: DEFAULT_GDB.to_string(),
            serial: None,
            runner: Box::new(SystemRunner),
            ports: Box::new(SystemPorts),
        }
    }

    /// Use a different GDB executable
    pub fn with_gdb(mut self, gdb: impl Into<String>) -> Self {
        self.gdb = gdb.into();
        self
    }

    /// Only consider the probe with this USB serial number
    pub fn with_serial(mut self, serial: Option<String>) -> Self {
        self.serial = serial;
        self
    }

    /// Replace the process runner
    pub fn with_runner(mut self, runner: Box<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Replace the serial port source
    pub fn with_ports(mut self, ports: Box<dyn PortEnumerator>) -> Self {
        self.ports = ports;
        self
    }

    /// GDB port found by the last successful probe
    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }

    /// ELF image expected next to `binary`
    pub fn companion_image(binary: &Path) -> PathBuf {
        binary.with_extension("elf")
    }

    /// GDB command line that loads and verifies `elf` through `port`
    pub fn flash_command(&self, elf: &Path, port: &str) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.gdb.as_str());
        cmd.arg(elf.display().to_string());
        cmd.option("-ex", format!("target extended-remote {}", port));
        for command in SESSION {
            cmd.option("-ex", *command);
        }
        cmd
    }

    /// Locate exactly one attached probe, returning its GDB port
    fn find_probe(&self) -> Result<Option<String>> {
        let ports = match self.ports.usb_ports() {
            Ok(ports) => ports,
            Err(e) => {
                log::debug!("{}", e);
                return Ok(None);
            }
        };

        let devices = find_devices(ports, self.serial.as_deref());
        match devices.as_slice() {
            [] => Ok(None),
            [device] => Ok(device.gdb_port().map(device_path)),
            _ => Err(FlashError::AmbiguousProbe(
                devices.iter().map(|d| d.label()).collect(),
            )),
        }
    }
}

impl Default for BlackmagicProgrammer {
    fn default() -> Self {
        Self::new()
    }
}

/// Path GDB needs to open a serial port
fn device_path(port: &str) -> String {
    if cfg!(windows) {
        format!(r"\\.\{}", port)
    } else {
        port.to_string()
    }
}

impl Programmer for BlackmagicProgrammer {
    fn identifier(&self) -> &str {
        IDENTIFIER
    }

    fn description(&self) -> &str {
        "Black Magic Probe GDB server over USB serial"
    }

    fn probe(&mut self) -> Result<bool> {
        self.port = None;
        self.port = self.find_probe()?;
        if let Some(port) = &self.port {
            log::debug!("Black Magic Probe GDB server at {}", port);
        }
        Ok(self.port.is_some())
    }

    fn flash(&mut self, binary: &Path, progress: &mut dyn FlashProgress) -> Result<()> {
        require_file(binary)?;

        let elf = Self::companion_image(binary);
        if !elf.exists() {
            log::error!(
                "Black Magic Probe can't flash .bin files, and {} doesn't exist",
                elf.display()
            );
            return Err(FlashError::CompanionImageMissing(elf));
        }

        if self.port.is_none() && !self.probe()? {
            return Err(FlashError::NoInterfaceFound);
        }
        let port = match &self.port {
            Some(port) => port.clone(),
            None => return Err(FlashError::NoInterfaceFound),
        };

        let cmd = self.flash_command(&elf, &port);
        log::debug!("Launching: {}", cmd);

        progress.start(&format!("Flashing via {}", IDENTIFIER));
        let result = self.runner.run(&cmd);
        let output = match result {
            Ok(output) => output.combined(),
            Err(e) => {
                progress.finish(false);
                return Err(e);
            }
        };
        let flashed = verify_output(&output);
        progress.finish(flashed);

        if flashed {
            return Ok(());
        }

        log::error!("Black Magic Probe failed to flash");
        log::error!("{}", output);
        Err(FlashError::VerificationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{UsbSerialPort, BLACKMAGIC};
    use probeflash_core::{NoProgress, ToolOutput};
    use std::cell::RefCell;
    use std::rc::Rc;

    const GOOD_OUTPUT: &str = "\
Target voltage: 3.3V
Available Targets:
No. Att Driver
 1      STM32WBxx
Loading section .isr_vector, size 0x13c lma 0x8000000
Loading section .text, size 0x1a2c4 lma 0x8000140
Start address 0x08000154, load size 107520
Section .isr_vector, range 0x8000000 -- 0x800013c: matched.
Section .text, range 0x8000140 -- 0x801a404: matched.
";

    struct ScriptedRunner {
        stdout: &'static str,
        calls: Rc<RefCell<Vec<ToolCommand>>>,
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, command: &ToolCommand) -> Result<ToolOutput> {
            self.calls.borrow_mut().push(command.clone());
            Ok(ToolOutput {
                code: Some(0),
                stdout: self.stdout.to_string(),
                stderr: String::new(),
            })
        }
    }

    struct FixedPorts(Vec<UsbSerialPort>);

    impl PortEnumerator for FixedPorts {
        fn usb_ports(&self) -> Result<Vec<UsbSerialPort>> {
            Ok(self.0.clone())
        }
    }

    /// Ports that can change between calls
    struct SharedPorts(Rc<RefCell<Vec<UsbSerialPort>>>);

    impl PortEnumerator for SharedPorts {
        fn usb_ports(&self) -> Result<Vec<UsbSerialPort>> {
            Ok(self.0.borrow().clone())
        }
    }

    fn bmp(port: &str, serial: &str) -> UsbSerialPort {
        UsbSerialPort {
            port_name: port.into(),
            vid: BLACKMAGIC.vid,
            pid: BLACKMAGIC.pid,
            serial_number: Some(serial.into()),
            manufacturer: Some("Black Magic Debug".into()),
            product: Some("Black Magic Probe".into()),
            interface: None,
        }
    }

    fn programmer(
        ports: Vec<UsbSerialPort>,
        stdout: &'static str,
    ) -> (BlackmagicProgrammer, Rc<RefCell<Vec<ToolCommand>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let runner = ScriptedRunner {
            stdout,
            calls: Rc::clone(&calls),
        };
        let p = BlackmagicProgrammer::new()
            .with_runner(Box::new(runner))
            .with_ports(Box::new(FixedPorts(ports)));
        (p, calls)
    }

    /// Creates `fw.bin` and, optionally, `fw.elf`
    fn firmware(with_elf: bool) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("fw.bin");
        std::fs::write(&bin, [0u8; 32]).unwrap();
        if with_elf {
            std::fs::write(dir.path().join("fw.elf"), b"\x7fELF").unwrap();
        }
        (dir, bin)
    }

    #[test]
    fn test_verify_output() {
        assert!(verify_output(GOOD_OUTPUT));
        assert!(!verify_output("Remote connection closed"));
        let mismatched = format!(
            "{}Section .data, range 0x801a404 -- 0x801a4f0: MIS-MATCHED!\n",
            GOOD_OUTPUT
        );
        assert!(!verify_output(&mismatched));
    }

    #[test]
    fn test_probe_caches_port() {
        let (mut p, calls) = programmer(
            vec![bmp("/dev/ttyACM1", "7BB180B4"), bmp("/dev/ttyACM0", "7BB180B4")],
            GOOD_OUTPUT,
        );
        assert!(p.probe().unwrap());
        assert!(p.port().is_some_and(|port| port.ends_with("ttyACM0")));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_probe_absent() {
        let (mut p, _) = programmer(Vec::new(), GOOD_OUTPUT);
        assert!(!p.probe().unwrap());
        assert_eq!(p.port(), None);
    }

    #[test]
    fn test_probe_two_devices_is_ambiguous() {
        let (mut p, _) = programmer(
            vec![bmp("/dev/ttyACM0", "AAAA"), bmp("/dev/ttyACM2", "BBBB")],
            GOOD_OUTPUT,
        );
        match p.probe() {
            Err(FlashError::AmbiguousProbe(devices)) => assert_eq!(devices.len(), 2),
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_ambiguous_probe_forgets_cached_port() {
        let ports = Rc::new(RefCell::new(vec![bmp("/dev/ttyACM0", "AAAA")]));
        let (p, calls) = programmer(Vec::new(), GOOD_OUTPUT);
        let mut p = p.with_ports(Box::new(SharedPorts(Rc::clone(&ports))));
        assert!(p.probe().unwrap());
        assert!(p.port().is_some());

        ports.borrow_mut().push(bmp("/dev/ttyACM2", "BBBB"));
        assert!(matches!(p.probe(), Err(FlashError::AmbiguousProbe(_))));
        assert_eq!(p.port(), None);

        // flash must rediscover and hit the same ambiguity
        let (_dir, bin) = firmware(true);
        assert!(matches!(
            p.flash(&bin, &mut NoProgress),
            Err(FlashError::AmbiguousProbe(_))
        ));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_serial_resolves_ambiguity() {
        let (p, _) = programmer(
            vec![bmp("/dev/ttyACM0", "AAAA"), bmp("/dev/ttyACM2", "BBBB")],
            GOOD_OUTPUT,
        );
        let mut p = p.with_serial(Some("BBBB".into()));
        assert!(p.probe().unwrap());
        assert!(p.port().is_some_and(|port| port.ends_with("ttyACM2")));
    }

    #[test]
    fn test_flash_requires_elf() {
        let (_dir, bin) = firmware(false);
        let (mut p, calls) = programmer(vec![bmp("/dev/ttyACM0", "AAAA")], GOOD_OUTPUT);

        let err = p.flash(&bin, &mut NoProgress).unwrap_err();
        assert!(matches!(err, FlashError::CompanionImageMissing(_)));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_flash_session_order() {
        let (_dir, bin) = firmware(true);
        let (mut p, calls) = programmer(vec![bmp("/dev/ttyACM0", "AAAA")], GOOD_OUTPUT);

        p.flash(&bin, &mut NoProgress).unwrap();

        let calls = calls.borrow();
        assert_eq!(calls.len(), 1);
        let cmd = &calls[0];
        assert_eq!(cmd.program(), DEFAULT_GDB);
        assert!(cmd.args()[0].ends_with("fw.elf"));
        let session: Vec<_> = cmd.values_of("-ex").collect();
        assert_eq!(session.len(), 8);
        assert!(session[0].starts_with("target extended-remote "));
        assert!(session[0].ends_with("ttyACM0"));
        assert_eq!(&session[1..], SESSION);
    }

    #[test]
    fn test_flash_fails_on_mismatch() {
        let (_dir, bin) = firmware(true);
        let (mut p, _) = programmer(
            vec![bmp("/dev/ttyACM0", "AAAA")],
            "Loading section .text, size 0x100 lma 0x8000000\n\
             Section .text, range 0x8000000 -- 0x8000100: MIS-MATCHED!\n",
        );

        let err = p.flash(&bin, &mut NoProgress).unwrap_err();
        assert!(matches!(err, FlashError::VerificationFailed));
    }

    #[test]
    fn test_flash_fails_without_load_marker() {
        let (_dir, bin) = firmware(true);
        let (mut p, _) = programmer(
            vec![bmp("/dev/ttyACM0", "AAAA")],
            "/dev/ttyACM0: No such file or directory.\n",
        );
        assert!(p.flash(&bin, &mut NoProgress).is_err());
    }

    #[test]
    fn test_flash_without_probe_fails() {
        let (_dir, bin) = firmware(true);
        let (mut p, calls) = programmer(Vec::new(), GOOD_OUTPUT);

        let err = p.flash(&bin, &mut NoProgress).unwrap_err();
        assert!(matches!(err, FlashError::NoInterfaceFound));
        assert!(calls.borrow().is_empty());
    }
}
