use std::time::Duration;

/// Sleep abstraction for retry loops.
///
/// The port locator and the serial reconnect loop both sleep between
/// attempts; injecting the clock keeps those loops testable without
/// real delays.
pub trait Clock: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Production clock backed by [`std::thread::sleep`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
