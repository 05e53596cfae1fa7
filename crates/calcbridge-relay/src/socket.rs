use std::io::ErrorKind;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use calcbridge_frame::{codec, BRIDGE_CONNECTED, DISCONNECT, INTERNET_DISCONNECTED};
use calcbridge_transport::{Clock, Medium, Result as TransportResult, TcpMedium, TransportError};
use tracing::{debug, error, info, warn};

use crate::config::RelayConfig;
use crate::endpoint::Endpoint;
use crate::error::{RelayError, Result};
use crate::peer::PeerSlot;

const READ_BUFFER_SIZE: usize = 4096;

/// Establishes the server connection. Separated from the channel so tests
/// can script the connection sequence.
pub trait SocketConnector: Send + Sync {
    fn connect(&self) -> TransportResult<Box<dyn Medium>>;
}

/// Production connector: one TCP dial per attempt, bounded by the connect
/// timeout, with the read side polled at the configured interval.
pub struct TcpConnector {
    addr: String,
    connect_timeout: Duration,
    poll_timeout: Duration,
}

impl TcpConnector {
    pub fn new(config: &RelayConfig) -> Self {
        Self {
            addr: config.server_addr(),
            connect_timeout: config.connect_timeout,
            poll_timeout: config.poll_timeout,
        }
    }
}

impl SocketConnector for TcpConnector {
    fn connect(&self) -> TransportResult<Box<dyn Medium>> {
        let medium = TcpMedium::connect(&self.addr, self.connect_timeout, self.poll_timeout)?;
        Ok(Box::new(medium))
    }
}

/// State shared between the socket worker and shutdown handles.
///
/// Teardown must be single-shot no matter who triggers it first (read loop,
/// coordinator, signal handler), so the calculator sees at most one
/// disconnect notice.
pub(crate) struct SocketShared {
    endpoint: Arc<Endpoint>,
    peer: PeerSlot,
    stop: AtomicBool,
    torn_down: AtomicBool,
}

impl SocketShared {
    fn new() -> Self {
        Self {
            endpoint: Arc::new(Endpoint::new("socket")),
            peer: PeerSlot::new(),
            stop: AtomicBool::new(false),
            torn_down: AtomicBool::new(false),
        }
    }

    pub(crate) fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Close the socket endpoint, optionally telling the serial peer the
    /// internet side is gone. Every call after the first is a no-op.
    pub(crate) fn teardown(&self, notify_peer: bool) {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }
        if notify_peer {
            if let Some(peer) = self.peer.get() {
                if let Err(err) = peer.write(INTERNET_DISCONNECTED.as_bytes()) {
                    debug!(%err, "serial side unavailable for disconnect notice");
                }
            }
        }
        self.endpoint.close();
    }
}

/// The socket side of the relay: connects to the server, forwards its
/// frames to the calculator, and tears the bridge down when either side
/// goes away.
pub struct SocketChannel {
    shared: Arc<SocketShared>,
    connector: Arc<dyn SocketConnector>,
    clock: Arc<dyn Clock>,
    retry_interval: Duration,
    handle: Option<JoinHandle<Result<()>>>,
}

impl SocketChannel {
    pub fn new(
        connector: Arc<dyn SocketConnector>,
        clock: Arc<dyn Clock>,
        retry_interval: Duration,
    ) -> Self {
        Self {
            shared: Arc::new(SocketShared::new()),
            connector,
            clock,
            retry_interval,
            handle: None,
        }
    }

    pub fn endpoint(&self) -> Arc<Endpoint> {
        Arc::clone(&self.shared.endpoint)
    }

    /// Publish the serial endpoint this channel forwards to.
    pub fn wire_peer(&self, peer: Arc<Endpoint>) {
        self.shared.peer.publish(peer);
    }

    pub(crate) fn shared(&self) -> Arc<SocketShared> {
        Arc::clone(&self.shared)
    }

    pub fn start(&mut self) -> Result<()> {
        let shared = Arc::clone(&self.shared);
        let connector = Arc::clone(&self.connector);
        let clock = Arc::clone(&self.clock);
        let retry_interval = self.retry_interval;
        let handle = std::thread::Builder::new()
            .name("socket-channel".to_string())
            .spawn(move || run(shared, connector, clock, retry_interval))?;
        self.handle = Some(handle);
        Ok(())
    }

    /// Stop the channel and notify the calculator. Safe to call more than
    /// once; the disconnect notice still goes out at most once.
    pub fn stop(&mut self) {
        self.shared.request_stop();
        self.shared.teardown(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Wait for the channel to finish on its own.
    pub fn join(&mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| RelayError::ChannelPanicked("socket"))?,
            None => Ok(()),
        }
    }
}

fn run(
    shared: Arc<SocketShared>,
    connector: Arc<dyn SocketConnector>,
    clock: Arc<dyn Clock>,
    retry_interval: Duration,
) -> Result<()> {
    // Startup barrier: the serial side must exist before we dial out, so
    // the handshake has somewhere to land.
    let peer = shared.peer.wait();

    let mut reader = match establish(&shared, connector.as_ref(), clock.as_ref(), retry_interval)?
    {
        Some(reader) => reader,
        None => return Ok(()),
    };

    if let Err(err) = peer.write(&codec::terminated(BRIDGE_CONNECTED)) {
        warn!(%err, "calculator missed the connect handshake");
    }
    info!("bridge established");

    let mut buf = [0u8; READ_BUFFER_SIZE];
    let result = loop {
        if shared.stopped() {
            break Ok(());
        }
        let n = match reader.read(&mut buf) {
            Ok(0) => {
                error!("server closed the connection");
                shared.teardown(true);
                break Ok(());
            }
            Ok(n) => n,
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                continue;
            }
            Err(err) => {
                error!(%err, "socket read failed");
                shared.teardown(true);
                break Err(err.into());
            }
        };

        match codec::decode_utf8(&buf[..n]) {
            Ok(text) if text == DISCONNECT => {
                info!("server requested disconnect");
                shared.teardown(false);
                break Ok(());
            }
            Ok(text) => {
                debug!(payload = %text, "socket -> serial");
                if let Err(err) = peer.write(text.as_bytes()) {
                    debug!(%err, "serial side rejected forward");
                }
            }
            Err(err) => warn!(%err, "dropping undecodable server frame"),
        }
    };

    let _ = reader.shutdown();
    result
}

/// Dial the server, retrying only on connect timeouts. Any other failure
/// is fatal for the whole bridge and surfaces through the join. Returns
/// None when stopped mid-dial.
fn establish(
    shared: &SocketShared,
    connector: &dyn SocketConnector,
    clock: &dyn Clock,
    retry_interval: Duration,
) -> Result<Option<Box<dyn Medium>>> {
    loop {
        if shared.stopped() {
            return Ok(None);
        }
        match connector.connect() {
            Ok(medium) => {
                let writer = match medium.try_clone() {
                    Ok(writer) => writer,
                    Err(err) => {
                        warn!(%err, "could not split server connection, redialing");
                        clock.sleep(retry_interval);
                        continue;
                    }
                };
                shared.endpoint.install(writer);
                return Ok(Some(medium));
            }
            Err(err @ TransportError::ConnectTimeout { .. }) => {
                warn!(%err, "server connect timed out, retrying");
                clock.sleep(retry_interval);
            }
            Err(err) => {
                error!(%err, "could not reach server");
                shared.teardown(true);
                return Err(err.into());
            }
        }
    }
}
