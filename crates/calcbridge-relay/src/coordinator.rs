use std::sync::Arc;

use calcbridge_transport::{Clock, SystemClock};
use tracing::info;

use crate::config::RelayConfig;
use crate::error::Result;
use crate::serial::{LocatorOpener, SerialChannel, SerialOpener};
use crate::socket::{SocketChannel, SocketConnector, SocketShared, TcpConnector};

/// Owns both channels and runs the bridge to completion.
///
/// Construction order matters: the serial side comes up first (blocking on
/// device discovery), the socket side dials only once a calculator exists.
pub struct Coordinator {
    serial: SerialChannel,
    socket: SocketChannel,
}

impl Coordinator {
    pub fn new(
        config: &RelayConfig,
        opener: Arc<dyn SerialOpener>,
        connector: Arc<dyn SocketConnector>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let serial = SerialChannel::new(
            opener,
            Arc::clone(&clock),
            config.retry_interval,
            config.reconnect,
        )?;
        info!("calculator link ready");

        let socket = SocketChannel::new(connector, clock, config.retry_interval);
        serial.wire_peer(socket.endpoint());
        socket.wire_peer(serial.endpoint());

        Ok(Self { serial, socket })
    }

    /// Production wiring: locator-driven serial discovery and plain TCP.
    pub fn from_config(config: &RelayConfig) -> Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let opener = Arc::new(LocatorOpener::new(config, Arc::clone(&clock)));
        let connector = Arc::new(TcpConnector::new(config));
        Self::new(config, opener, connector, clock)
    }

    /// A handle that can end the bridge from another thread, typically a
    /// signal handler.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            shared: self.socket.shared(),
        }
    }

    /// Run both channels until the socket side finishes, then wind the
    /// serial side down. A server-initiated disconnect therefore ends the
    /// whole process instead of leaving the serial loop orphaned.
    pub fn run(mut self) -> Result<()> {
        self.serial.start()?;
        self.socket.start()?;

        let result = self.socket.join();
        self.serial.stop();
        info!("bridge stopped");
        result
    }
}

/// Clonable trigger for ending the bridge. The disconnect notice to the
/// calculator still goes out at most once across all handles.
#[derive(Clone)]
pub struct ShutdownHandle {
    shared: Arc<SocketShared>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.shared.request_stop();
        self.shared.teardown(true);
    }
}
