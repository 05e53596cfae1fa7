//! Wire frame handling for the calculator bridge protocol.
//!
//! Frames are UTF-8 text, optionally terminated by a single null byte.
//! The terminator is a transport delimiter, not payload, and must be
//! stripped before a frame is forwarded. A handful of reserved control
//! values carry protocol meaning instead of being relayed as user data.

pub mod codec;
pub mod control;
pub mod error;

pub use codec::{decode_serial_payload, decode_utf8, strip_delimiters, terminated, DELIMITER};
pub use control::{BRIDGE_CONNECTED, DISCONNECT, INTERNET_DISCONNECTED};
pub use error::{FrameError, Result};
