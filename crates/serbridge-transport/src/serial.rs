use serde::Serialize;
use tokio_serial::{SerialPortBuilderExt, SerialPortType};
use tracing::info;

use crate::error::{Result, TransportError};

pub use tokio_serial::SerialStream;

/// Open a serial device for async read/write at the given baud rate.
///
/// The device is opened once and closed when the returned stream is dropped.
pub fn open_serial(device: &str, baud: u32) -> Result<SerialStream> {
    let stream = tokio_serial::new(device, baud)
        .open_native_async()
        .map_err(|source| TransportError::Open {
            device: device.to_string(),
            baud,
            source,
        })?;
    info!(device, baud, "opened serial device");
    Ok(stream)
}

/// A serial port discovered on this host.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vid: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
}

/// Enumerate serial ports, sorted by name.
pub fn available_ports() -> Result<Vec<PortInfo>> {
    let mut ports: Vec<PortInfo> = tokio_serial::available_ports()
        .map_err(TransportError::Enumerate)?
        .into_iter()
        .map(|port| port_info(port.port_name, port.port_type))
        .collect();
    ports.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(ports)
}

fn port_info(name: String, port_type: SerialPortType) -> PortInfo {
    let mut info = PortInfo {
        name,
        kind: "unknown",
        vid: None,
        pid: None,
        manufacturer: None,
        product: None,
        serial_number: None,
    };
    match port_type {
        SerialPortType::UsbPort(usb) => {
            info.kind = "usb";
            info.vid = Some(usb.vid);
            info.pid = Some(usb.pid);
            info.manufacturer = usb.manufacturer;
            info.product = usb.product;
            info.serial_number = usb.serial_number;
        }
        SerialPortType::PciPort => info.kind = "pci",
        SerialPortType::BluetoothPort => info.kind = "bluetooth",
        _ => {}
    }
    info
}
