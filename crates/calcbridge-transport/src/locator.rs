use std::sync::Arc;
use std::time::Duration;

use serialport::SerialPortType;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::Result;

/// Description substrings that identify the calculator, matched
/// case-sensitively against each port's USB product string.
pub const PORT_MARKERS: [&str; 2] = ["USB Serial Device", "TI-84"];

/// An attached serial port as seen by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortEntry {
    /// Device path, e.g. `/dev/ttyACM0` or `COM3`.
    pub path: String,
    /// Human-readable description (USB product string where available).
    pub description: String,
}

/// Discovers the calculator's serial device by polling the attached ports.
///
/// `locate` never fails: the device may be plugged in after the process
/// starts, and the serial reconnect path reuses the exact same discovery
/// logic, so absence is an expected state rather than an error.
pub struct PortLocator {
    interval: Duration,
    clock: Arc<dyn Clock>,
}

impl PortLocator {
    pub fn new(interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { interval, clock }
    }

    /// Block until a matching device is present and return its path.
    pub fn locate(&self) -> String {
        loop {
            self.clock.sleep(self.interval);
            match list_ports() {
                Ok(ports) => {
                    if let Some(path) = find_marked_port(&ports) {
                        info!(path, "located calculator serial device");
                        return path;
                    }
                    debug!(scanned = ports.len(), "no matching serial device yet");
                }
                Err(err) => debug!(%err, "serial port scan failed"),
            }
        }
    }
}

/// Enumerate all attached serial ports.
pub fn list_ports() -> Result<Vec<PortEntry>> {
    let ports = available_ports_described()?;
    Ok(ports)
}

fn available_ports_described() -> Result<Vec<PortEntry>> {
    let infos = serialport::available_ports().map_err(std::io::Error::from)?;
    Ok(infos
        .into_iter()
        .map(|info| PortEntry {
            path: info.port_name,
            description: describe(&info.port_type),
        })
        .collect())
}

fn describe(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(usb) => usb.product.clone().unwrap_or_else(|| "USB".to_string()),
        SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        SerialPortType::PciPort => "PCI".to_string(),
        SerialPortType::Unknown => "unknown".to_string(),
    }
}

/// Single scan pass: first port whose description carries a marker.
pub fn find_marked_port(ports: &[PortEntry]) -> Option<String> {
    ports
        .iter()
        .find(|port| {
            PORT_MARKERS
                .iter()
                .any(|marker| port.description.contains(marker))
        })
        .map(|port| port.path.clone())
}
