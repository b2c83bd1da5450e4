//! CLI argument parsing

use clap::builder::PossibleValuesParser;
use clap::{Parser, Subcommand};
use probeflash_flash::{builtin_identifiers, RegistryConfig, DEFAULT_GDB, DEFAULT_OPENOCD};
use std::path::PathBuf;

/// Generate dynamic help text for the interface argument
fn interface_help() -> String {
    format!(
        "Interface to use, probed automatically if omitted [available: {}]",
        builtin_identifiers().join(", ")
    )
}

#[derive(Parser)]
#[command(name = "probeflash")]
#[command(author, version, about = "Flash firmware through a debug probe", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// OpenOCD executable
    #[arg(long, global = true, default_value = DEFAULT_OPENOCD)]
    pub openocd: String,

    /// GDB executable used with the Black Magic Probe
    #[arg(long, global = true, default_value = DEFAULT_GDB)]
    pub gdb: String,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Registry settings for the selected command
    pub fn registry_config(&self) -> RegistryConfig {
        let serial = match &self.command {
            Commands::Flash { serial, .. } | Commands::Probe { serial } => serial.clone(),
            Commands::ListInterfaces => None,
        };
        RegistryConfig {
            openocd: self.openocd.clone(),
            gdb: self.gdb.clone(),
            serial,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Flash a binary
    Flash {
        /// Binary to flash
        #[arg(long)]
        bin: PathBuf,

        #[arg(long, help = interface_help(), value_parser = PossibleValuesParser::new(builtin_identifiers()))]
        interface: Option<String>,

        /// Serial number of the probe to use
        #[arg(long)]
        serial: Option<String>,
    },

    /// Probe for attached interfaces
    Probe {
        /// Serial number of the probe to look for
        #[arg(long)]
        serial: Option<String>,
    },

    /// List supported interfaces
    ListInterfaces,
}
