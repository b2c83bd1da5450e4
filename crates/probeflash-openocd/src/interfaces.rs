//! Built-in OpenOCD interface definitions

use probeflash_core::ProbeConfig;

/// SEGGER J-Link
pub const JLINK: ProbeConfig = ProbeConfig {
    name: "jlink",
    description: "SEGGER J-Link over SWD (OpenOCD)",
    profile_file: "interface/jlink.cfg",
    serial_command: "jlink_serial",
    extra_init: &["transport select swd"],
};

/// CMSIS-DAP compatible probes (DAPLink, Picoprobe, ...)
pub const CMSIS_DAP: ProbeConfig = ProbeConfig {
    name: "cmsis-dap",
    description: "CMSIS-DAP probe over SWD (OpenOCD)",
    profile_file: "interface/cmsis-dap.cfg",
    serial_command: "cmsis_dap_serial",
    extra_init: &["transport select swd"],
};

/// ST-Link V2/V3
pub const STLINK: ProbeConfig = ProbeConfig {
    name: "stlink",
    description: "ST-Link over HLA SWD (OpenOCD)",
    profile_file: "interface/stlink.cfg",
    serial_command: "hla_serial",
    extra_init: &["transport select hla_swd"],
};

/// All OpenOCD interfaces, in auto-probe order
pub const INTERFACES: &[ProbeConfig] = &[JLINK, CMSIS_DAP, STLINK];

/// Look up a built-in interface by name
pub fn find_interface(name: &str) -> Option<&'static ProbeConfig> {
    INTERFACES.iter().find(|i| i.name == name)
}
