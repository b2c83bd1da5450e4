//! USB serial port discovery

use probeflash_core::{FlashError, Result};
use serialport::{available_ports, SerialPortType};
use std::collections::BTreeMap;

/// USB vendor/product pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsbDevice {
    pub vid: u16,
    pub pid: u16,
}

impl UsbDevice {
    fn matches(&self, port: &UsbSerialPort) -> bool {
        port.vid == self.vid && port.pid == self.pid
    }
}

/// Black Magic Probe (native firmware)
pub const BLACKMAGIC: UsbDevice = UsbDevice {
    vid: 0x1d50,
    pid: 0x6018,
};

/// A serial port backed by a USB device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsbSerialPort {
    pub port_name: String,
    pub vid: u16,
    pub pid: u16,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    /// USB interface number; the GDB server is interface 0
    pub interface: Option<u8>,
}

impl UsbSerialPort {
    /// True if this port belongs to a Black Magic Probe
    pub fn is_blackmagic(&self) -> bool {
        BLACKMAGIC.matches(self)
            || self
                .product
                .as_deref()
                .is_some_and(|p| p.to_lowercase().contains("black magic"))
    }
}

/// Source of USB serial ports
pub trait PortEnumerator {
    /// List the USB serial ports currently attached
    fn usb_ports(&self) -> Result<Vec<UsbSerialPort>>;
}

/// [`PortEnumerator`] backed by the `serialport` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPorts;

impl PortEnumerator for SystemPorts {
    fn usb_ports(&self) -> Result<Vec<UsbSerialPort>> {
        let ports = available_ports().map_err(|e| FlashError::PortEnumeration(e.to_string()))?;

        Ok(ports
            .into_iter()
            .filter_map(|info| match info.port_type {
                SerialPortType::UsbPort(usb) => Some(UsbSerialPort {
                    port_name: info.port_name,
                    vid: usb.vid,
                    pid: usb.pid,
                    serial_number: usb.serial_number,
                    manufacturer: usb.manufacturer,
                    product: usb.product,
                    interface: usb.interface,
                }),
                _ => None,
            })
            .collect())
    }
}

/// One physical probe, with all the serial ports it exposes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeDevice {
    pub serial_number: Option<String>,
    /// Port names in USB interface order; the GDB server comes first
    pub ports: Vec<String>,
}

impl ProbeDevice {
    /// Port the GDB server listens on
    pub fn gdb_port(&self) -> Option<&str> {
        self.ports.first().map(String::as_str)
    }

    /// Short label used in ambiguity errors
    pub fn label(&self) -> String {
        let port = self.gdb_port().unwrap_or("?");
        match &self.serial_number {
            Some(serial) => format!("{} (serial {})", port, serial),
            None => port.to_string(),
        }
    }
}

/// Group Black Magic ports into physical devices.
///
/// Each probe exposes two ports (GDB server and UART) sharing one USB serial
/// number. Ports without a serial number cannot be paired and are treated as
/// separate devices. When `serial` is given only that probe is kept.
pub fn find_devices(ports: Vec<UsbSerialPort>, serial: Option<&str>) -> Vec<ProbeDevice> {
    let mut by_serial: BTreeMap<String, Vec<UsbSerialPort>> = BTreeMap::new();
    let mut unpaired = Vec::new();

    for port in ports.into_iter().filter(UsbSerialPort::is_blackmagic) {
        if serial.is_some() && port.serial_number.as_deref() != serial {
            continue;
        }
        match port.serial_number.clone() {
            Some(sn) => by_serial.entry(sn).or_default().push(port),
            None => unpaired.push(port),
        }
    }

    let mut devices: Vec<ProbeDevice> = by_serial
        .into_iter()
        .map(|(sn, mut ports)| {
            ports.sort_by(|a, b| port_order(a).cmp(&port_order(b)));
            ProbeDevice {
                serial_number: Some(sn),
                ports: ports.into_iter().map(|p| p.port_name).collect(),
            }
        })
        .collect();

    unpaired.sort_by(|a, b| natural_key(&a.port_name).cmp(&natural_key(&b.port_name)));
    devices.extend(unpaired.into_iter().map(|port| ProbeDevice {
        serial_number: None,
        ports: vec![port.port_name],
    }));

    devices
}

/// Ports with a known USB interface number first, lowest first, then by name
fn port_order(port: &UsbSerialPort) -> (u8, (&str, Option<u64>)) {
    (
        port.interface.unwrap_or(u8::MAX),
        natural_key(&port.port_name),
    )
}

/// Split a trailing number off a port name so `ttyACM9` sorts before
/// `ttyACM10` and `COM9` before `COM10`
fn natural_key(name: &str) -> (&str, Option<u64>) {
    let digits = name.len() - name.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    let (prefix, number) = name.split_at(name.len() - digits);
    (prefix, number.parse().ok())
}
