use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::medium::Medium;

/// Socket side of the bridge: the TCP link to the remote server.
pub struct TcpMedium {
    stream: TcpStream,
}

impl TcpMedium {
    /// Connect to `addr` (a `host:port` string) with a bounded connect
    /// timeout, then switch reads to the short poll timeout that keeps the
    /// channel's read loop responsive to shutdown.
    pub fn connect(addr: &str, connect_timeout: Duration, read_timeout: Duration) -> Result<Self> {
        let socket_addr = addr
            .to_socket_addrs()
            .map_err(|source| TransportError::Connect {
                addr: addr.to_string(),
                source,
            })?
            .next()
            .ok_or_else(|| TransportError::InvalidAddress {
                addr: addr.to_string(),
            })?;

        debug!(addr, ?socket_addr, "connecting to server");
        let stream = TcpStream::connect_timeout(&socket_addr, connect_timeout).map_err(
            |source| match source.kind() {
                ErrorKind::TimedOut | ErrorKind::WouldBlock => TransportError::ConnectTimeout {
                    addr: addr.to_string(),
                },
                _ => TransportError::Connect {
                    addr: addr.to_string(),
                    source,
                },
            },
        )?;
        stream.set_read_timeout(Some(read_timeout))?;

        info!(addr, "connected to server");
        Ok(Self { stream })
    }
}

impl Read for TcpMedium {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Write for TcpMedium {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.stream.flush()
    }
}

impl Medium for TcpMedium {
    fn try_clone(&self) -> Result<Box<dyn Medium>> {
        let stream = self.stream.try_clone()?;
        Ok(Box::new(Self { stream }))
    }

    fn shutdown(&mut self) -> Result<()> {
        // NotConnected is expected when the remote side closed first.
        match self.stream.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotConnected => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
