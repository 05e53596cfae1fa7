use std::io::{Read, Write};

use crate::error::Result;

/// A connected bridge medium.
///
/// The serial port and the TCP stream both present this surface so the
/// relay channels can treat "the thing I read from and my peer writes to"
/// uniformly, and so tests can substitute scripted media.
///
/// Reads respect the timeout configured at open/connect time, returning an
/// error of kind `TimedOut` or `WouldBlock` when no data arrives in time.
pub trait Medium: Read + Write + Send {
    /// Create a second handle to the same underlying medium.
    ///
    /// Used to split a medium into the read half owned by the channel
    /// thread and the write half guarded by the endpoint lock.
    fn try_clone(&self) -> Result<Box<dyn Medium>>;

    /// Number of bytes already buffered and readable without blocking.
    ///
    /// Zero for media that cannot report this; callers then fall back to a
    /// bounded blocking read.
    fn bytes_to_read(&mut self) -> Result<u32> {
        Ok(0)
    }

    /// Tear down the underlying connection, waking any blocked reader on
    /// a cloned handle where the OS supports it.
    fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}
