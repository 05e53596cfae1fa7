//! Media layer for the calculator bridge.
//!
//! Provides a unified interface over the two endpoint media:
//! - A locally attached serial device (the calculator)
//! - A TCP connection to the remote server
//!
//! This is the lowest layer of calcbridge. Everything else builds on top of
//! the [`Medium`] trait provided here, plus the [`PortLocator`] used to find
//! the calculator among the attached serial devices.

pub mod clock;
pub mod error;
pub mod locator;
pub mod medium;
pub mod serial;
pub mod tcp;

pub use clock::{Clock, SystemClock};
pub use error::{Result, TransportError};
pub use locator::{PortEntry, PortLocator, PORT_MARKERS};
pub use medium::Medium;
pub use serial::SerialMedium;
pub use tcp::TcpMedium;
