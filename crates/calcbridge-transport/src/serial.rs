use std::io::{Read, Write};
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::info;

use crate::error::{Result, TransportError};
use crate::medium::Medium;

/// Serial side of the bridge: the calculator's USB serial device.
///
/// 8N1 framing, no flow control. The read timeout bounds how long the
/// channel's read loop blocks when the device is idle.
pub struct SerialMedium {
    port: Box<dyn SerialPort>,
}

impl SerialMedium {
    /// Open a serial device.
    ///
    /// Permission failures are distinguished from other open failures so the
    /// caller can surface a remediation hint instead of retrying.
    pub fn open(path: &str, baud_rate: u32, timeout: Duration) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(timeout)
            .open()
            .map_err(|source| classify_open_error(path, source))?;

        info!(path, baud_rate, "opened serial port");
        Ok(Self { port })
    }
}

fn classify_open_error(path: &str, source: serialport::Error) -> TransportError {
    match source.kind() {
        serialport::ErrorKind::Io(std::io::ErrorKind::PermissionDenied) => {
            TransportError::PermissionDenied {
                path: path.to_string(),
                source,
            }
        }
        _ => TransportError::Open {
            path: path.to_string(),
            source,
        },
    }
}

impl Read for SerialMedium {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialMedium {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.port.flush()
    }
}

impl Medium for SerialMedium {
    fn try_clone(&self) -> Result<Box<dyn Medium>> {
        let port = self.port.try_clone().map_err(std::io::Error::from)?;
        Ok(Box::new(Self { port }))
    }

    fn bytes_to_read(&mut self) -> Result<u32> {
        let pending = self.port.bytes_to_read().map_err(std::io::Error::from)?;
        Ok(pending)
    }
}
