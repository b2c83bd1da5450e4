//! probeflash - flash firmware through an auto-detected debug probe
//!
//! Firmware is written by shelling out to an existing debugger front-end:
//! - **OpenOCD** for J-Link, CMSIS-DAP and ST-Link probes
//! - **GDB** for the Black Magic Probe, which runs its own GDB server
//!
//! When no `--interface` is given every supported probe is tried in turn.
//! Flashing only proceeds if exactly one answers.

mod cli;
mod commands;
mod progress;

use clap::Parser;
use cli::{Cli, Commands};
use probeflash_flash::{Orchestrator, ProgrammerRegistry};
use progress::IndicatifProgress;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logger; RUST_LOG still wins over -v
    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let registry = ProgrammerRegistry::builtin(&cli.registry_config());

    let result = match &cli.command {
        Commands::Flash { bin, interface, .. } => {
            let mut orchestrator = Orchestrator::new(registry);
            let mut progress = IndicatifProgress::new();
            commands::run_flash(
                &mut orchestrator,
                bin,
                interface.as_deref(),
                &mut progress,
            )
            .map(|_| ())
        }
        Commands::Probe { .. } => {
            let mut orchestrator = Orchestrator::new(registry);
            commands::run_probe(&mut orchestrator).map(|_| ())
        }
        Commands::ListInterfaces => {
            commands::list_interfaces(&registry);
            Ok(())
        }
    };

    if let Err(e) = &result {
        log::error!("{}", e);
    }
    ExitCode::from(commands::exit_status(&result))
}
