use std::io::ErrorKind;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use calcbridge_frame::{codec, BRIDGE_CONNECTED};
use calcbridge_transport::{
    Clock, Medium, PortLocator, Result as TransportResult, SerialMedium, TransportError,
};
use tracing::{debug, error, info, warn};

use crate::config::RelayConfig;
use crate::endpoint::Endpoint;
use crate::error::{RelayError, Result};
use crate::peer::PeerSlot;

const READ_BUFFER_SIZE: usize = 4096;

/// Supplies an open serial medium, blocking on discovery when needed.
///
/// First-time startup and the reconnect loop go through the same opener,
/// so rediscovery after a failure behaves exactly like initial discovery.
pub trait SerialOpener: Send + Sync {
    fn open(&self) -> TransportResult<Box<dyn Medium>>;
}

/// Production opener: run the port locator (or use the pinned path) and
/// open the device at the configured baud rate and idle timeout.
pub struct LocatorOpener {
    manual_port: Option<String>,
    baud_rate: u32,
    timeout: Duration,
    locator: PortLocator,
}

impl LocatorOpener {
    pub fn new(config: &RelayConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            manual_port: config.manual_port.clone(),
            baud_rate: config.baud_rate,
            timeout: config.serial_timeout,
            locator: PortLocator::new(config.retry_interval, clock),
        }
    }
}

impl SerialOpener for LocatorOpener {
    fn open(&self) -> TransportResult<Box<dyn Medium>> {
        let path = match &self.manual_port {
            Some(path) => path.clone(),
            None => self.locator.locate(),
        };
        let medium = SerialMedium::open(&path, self.baud_rate, self.timeout)?;
        Ok(Box::new(medium))
    }
}

/// The serial side of the relay: reads frames from the calculator and
/// forwards them to the socket peer, reopening the device after I/O
/// failures when reconnect is enabled.
pub struct SerialChannel {
    endpoint: Arc<Endpoint>,
    peer: Arc<PeerSlot>,
    stop: Arc<AtomicBool>,
    opener: Arc<dyn SerialOpener>,
    clock: Arc<dyn Clock>,
    retry_interval: Duration,
    reconnect: bool,
    reader: Option<Box<dyn Medium>>,
    handle: Option<JoinHandle<()>>,
}

impl SerialChannel {
    /// Open the device and split it into the loop's read handle and the
    /// endpoint's lock-guarded write handle.
    ///
    /// Blocks until a device is discovered: the calculator is a hard
    /// prerequisite for the whole relay. Permission failures propagate as
    /// fatal startup errors.
    pub fn new(
        opener: Arc<dyn SerialOpener>,
        clock: Arc<dyn Clock>,
        retry_interval: Duration,
        reconnect: bool,
    ) -> Result<Self> {
        let reader = opener.open()?;
        let writer = reader.try_clone()?;
        let endpoint = Arc::new(Endpoint::new("serial"));
        endpoint.install(writer);

        Ok(Self {
            endpoint,
            peer: Arc::new(PeerSlot::new()),
            stop: Arc::new(AtomicBool::new(false)),
            opener,
            clock,
            retry_interval,
            reconnect,
            reader: Some(reader),
            handle: None,
        })
    }

    pub fn endpoint(&self) -> Arc<Endpoint> {
        Arc::clone(&self.endpoint)
    }

    /// Publish the socket endpoint this channel forwards to.
    pub fn wire_peer(&self, peer: Arc<Endpoint>) {
        self.peer.publish(peer);
    }

    /// Begin the read loop on its own thread.
    pub fn start(&mut self) -> Result<()> {
        let Some(reader) = self.reader.take() else {
            return Ok(());
        };
        let worker = Worker {
            endpoint: Arc::clone(&self.endpoint),
            peer: Arc::clone(&self.peer),
            stop: Arc::clone(&self.stop),
            opener: Arc::clone(&self.opener),
            clock: Arc::clone(&self.clock),
            retry_interval: self.retry_interval,
            reconnect: self.reconnect,
        };
        let handle = std::thread::Builder::new()
            .name("serial-channel".to_string())
            .spawn(move || worker.run(reader))?;
        self.handle = Some(handle);
        Ok(())
    }

    /// Cooperative shutdown: flag the loop, drop the write handle, then
    /// join. The in-flight blocking read is bounded by the idle timeout,
    /// so the join returns within one tick. Safe to call more than once.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        self.endpoint.close();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    pub fn join(&mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| RelayError::ChannelPanicked("serial")),
            None => Ok(()),
        }
    }
}

struct Worker {
    endpoint: Arc<Endpoint>,
    peer: Arc<PeerSlot>,
    stop: Arc<AtomicBool>,
    opener: Arc<dyn SerialOpener>,
    clock: Arc<dyn Clock>,
    retry_interval: Duration,
    reconnect: bool,
}

impl Worker {
    fn run(self, mut reader: Box<dyn Medium>) {
        // Startup barrier: never process data before the peer exists.
        let peer = self.peer.wait();
        let mut buf = [0u8; READ_BUFFER_SIZE];

        while !self.stopped() {
            let n = match read_chunk(reader.as_mut(), &mut buf) {
                Ok(n) => n,
                Err(err) => {
                    warn!(%err, "serial read failed");
                    if !self.reconnect {
                        break;
                    }
                    match self.reacquire() {
                        Some(medium) => {
                            reader = medium;
                            continue;
                        }
                        None => break,
                    }
                }
            };
            if n == 0 {
                continue;
            }

            match codec::decode_serial_payload(&buf[..n]) {
                Ok(text) if text.is_empty() => {}
                Ok(text) => {
                    debug!(payload = %text, "serial -> socket");
                    if let Err(err) = peer.write(text.as_bytes()) {
                        debug!(%err, "socket side rejected forward");
                    }
                }
                Err(err) => warn!(%err, "dropping undecodable serial frame"),
            }
        }

        self.endpoint.take_offline();
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Unbounded reconnect: sleep, re-run discovery, reopen, re-announce.
    ///
    /// The handshake is resent through the endpoint's write lock so it
    /// precedes any payload the socket side forwards afterwards. Returns
    /// the fresh read handle, or None when the channel should terminate.
    fn reacquire(&self) -> Option<Box<dyn Medium>> {
        self.endpoint.take_offline();
        info!("serial link lost, rediscovering device");

        while !self.stopped() {
            self.clock.sleep(self.retry_interval);
            let medium = match self.opener.open() {
                Ok(medium) => medium,
                Err(err @ TransportError::PermissionDenied { .. }) => {
                    error!(%err, "serial device no longer accessible");
                    return None;
                }
                Err(err) => {
                    debug!(%err, "reconnect attempt failed");
                    continue;
                }
            };
            let writer = match medium.try_clone() {
                Ok(writer) => writer,
                Err(err) => {
                    debug!(%err, "could not split reopened device");
                    continue;
                }
            };

            self.endpoint.install(writer);
            if let Err(err) = self
                .endpoint
                .write(&codec::terminated(BRIDGE_CONNECTED))
            {
                warn!(%err, "handshake resend failed, retrying");
                self.endpoint.take_offline();
                continue;
            }
            info!("serial link reestablished");
            return Some(medium);
        }
        None
    }
}

/// Block for the next bytes (bounded by the idle timeout), then drain
/// whatever else queued up while the read was blocked, so a frame that
/// dribbles in is handed to the decoder in one piece. A timeout with no
/// data is not an error.
fn read_chunk(medium: &mut dyn Medium, buf: &mut [u8]) -> Result<usize> {
    let mut n = match medium.read(buf) {
        Ok(n) => n,
        Err(err)
            if matches!(
                err.kind(),
                ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
            ) =>
        {
            return Ok(0);
        }
        Err(err) => return Err(err.into()),
    };

    if n > 0 && n < buf.len() {
        let pending = medium.bytes_to_read()? as usize;
        let top_up = pending.min(buf.len() - n);
        if top_up > 0 {
            n += medium.read(&mut buf[n..n + top_up])?;
        }
    }
    Ok(n)
}
