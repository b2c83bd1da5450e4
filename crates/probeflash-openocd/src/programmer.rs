//! OpenOCD programmer implementation

use probeflash_core::{
    require_file, CommandRunner, FlashError, FlashProgress, ProbeConfig, Programmer, Result,
    SystemRunner, ToolCommand,
};
use std::path::Path;

/// Executable launched when no override is configured
pub const DEFAULT_OPENOCD: &str = "openocd";

/// Target family profile loaded after the interface
pub const TARGET_CONFIG: &str = "target/stm32wbx.cfg";

/// Flash base address passed to `program`
pub const FLASH_BASE: u32 = 0x0800_0000;

/// Programmer that drives a probe through OpenOCD
pub struct OpenOcdProgrammer {
    config: ProbeConfig,
    executable: String,
    serial: Option<String>,
    runner: Box<dyn CommandRunner>,
}

impl OpenOcdProgrammer {
    /// Create a programmer for `config` using the system `openocd`
    pub fn new(config: ProbeConfig) -> Self {
        Self {
            config,
            executable: DEFAULT_OPENOCD.to_string(),
            serial: None,
            runner: Box::new(SystemRunner),
        }
    }

    /// Use a different OpenOCD executable
    pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = executable.into();
        self
    }

    /// Only talk to the probe with this serial number
    pub fn with_serial(mut self, serial: Option<String>) -> Self {
        self.serial = serial;
        self
    }

    /// Replace the process runner
    pub fn with_runner(mut self, runner: Box<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Interface description this programmer was built from
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Interface, serial selection, extra init, target and `init`
    fn base_command(&self) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.executable.as_str());
        cmd.option("-f", self.config.profile_file);
        if let Some(serial) = &self.serial {
            cmd.option("-c", format!("{} {}", self.config.serial_command, serial));
        }
        for init in self.config.extra_init {
            cmd.option("-c", *init);
        }
        cmd.option("-f", TARGET_CONFIG).option("-c", "init");
        cmd
    }

    /// Command line that connects and exits without touching flash
    pub fn probe_command(&self) -> ToolCommand {
        let mut cmd = self.base_command();
        cmd.option("-c", "exit");
        cmd
    }

    /// Command line that programs, verifies and resets the target
    pub fn flash_command(&self, binary: &Path) -> ToolCommand {
        let mut cmd = self.base_command();
        cmd.option(
            "-c",
            format!(
                "program {{{}}} verify reset exit 0x{:08x}",
                binary.display(),
                FLASH_BASE
            ),
        );
        cmd
    }
}

impl Programmer for OpenOcdProgrammer {
    fn identifier(&self) -> &str {
        self.config.name
    }

    fn description(&self) -> &str {
        self.config.description
    }

    fn probe(&mut self) -> Result<bool> {
        let cmd = self.probe_command();
        log::debug!("Launching: {}", cmd);

        match self.runner.run(&cmd) {
            Ok(output) if output.success() => Ok(true),
            Ok(output) => {
                log::debug!("{}", output.stderr.trim());
                Ok(false)
            }
            Err(e) => {
                log::debug!("{}", e);
                Ok(false)
            }
        }
    }

    fn flash(&mut self, binary: &Path, progress: &mut dyn FlashProgress) -> Result<()> {
        require_file(binary)?;

        let cmd = self.flash_command(binary);
        log::debug!("Launching: {}", cmd);

        progress.start(&format!("Flashing via {}", self.config.name));
        let result = self.runner.run(&cmd);
        progress.finish(matches!(&result, Ok(output) if output.success()));

        let output = result?;
        if output.success() {
            return Ok(());
        }

        log::error!("OpenOCD failed to flash");
        log::error!("{}", output.combined());
        Err(FlashError::ToolFailed {
            tool: self.executable.clone(),
            code: output.code,
        })
    }
}
