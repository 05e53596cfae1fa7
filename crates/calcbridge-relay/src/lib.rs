//! The relay engine: two independently-failing channels bridged in both
//! directions.
//!
//! The serial channel reads frames from the calculator and forwards them to
//! the socket channel; the socket channel reads from the server and forwards
//! serial-ward. Each channel owns its medium, an alive flag, and a write
//! lock; a one-shot peer slot forms the startup barrier so neither side
//! writes to a channel that does not exist yet.

pub mod config;
pub mod coordinator;
pub mod endpoint;
pub mod error;
pub mod peer;
pub mod serial;
pub mod socket;

#[cfg(test)]
pub(crate) mod support;

pub use config::RelayConfig;
pub use coordinator::{Coordinator, ShutdownHandle};
pub use endpoint::Endpoint;
pub use error::{RelayError, Result};
pub use peer::PeerSlot;
pub use serial::{LocatorOpener, SerialChannel, SerialOpener};
pub use socket::{SocketChannel, SocketConnector, TcpConnector};
