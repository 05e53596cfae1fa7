use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use calcbridge_transport::Medium;
use tracing::debug;

use crate::error::{RelayError, Result};

/// One side of the relay as seen by its peer: an alive flag plus a
/// lock-guarded write handle to the medium.
///
/// The channel's read loop owns a separate cloned handle; only writes go
/// through the endpoint. Holding the lock across the full write keeps
/// frames from interleaving, and checking `alive` first keeps writes from
/// touching a dead medium.
pub struct Endpoint {
    name: &'static str,
    alive: AtomicBool,
    writer: Mutex<Option<Box<dyn Medium>>>,
}

impl Endpoint {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            alive: AtomicBool::new(false),
            writer: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Write a whole frame under the endpoint lock.
    ///
    /// Fails fast with `ChannelClosed` while the channel is not alive.
    pub fn write(&self, bytes: &[u8]) -> Result<usize> {
        if !self.is_alive() {
            return Err(RelayError::ChannelClosed(self.name));
        }
        let mut guard = self.lock_writer();
        let medium = guard
            .as_mut()
            .ok_or(RelayError::ChannelClosed(self.name))?;
        medium.write_all(bytes)?;
        medium.flush()?;
        Ok(bytes.len())
    }

    /// Install a (re)opened write handle and mark the channel alive.
    pub(crate) fn install(&self, medium: Box<dyn Medium>) {
        let mut guard = self.lock_writer();
        *guard = Some(medium);
        self.alive.store(true, Ordering::SeqCst);
        debug!(endpoint = self.name, "medium installed");
    }

    /// Mark the channel dead and drop the write handle. Pending writers
    /// already holding the lock finish first; later writers fail fast.
    pub(crate) fn take_offline(&self) {
        self.alive.store(false, Ordering::SeqCst);
        let mut guard = self.lock_writer();
        guard.take();
    }

    /// Like `take_offline`, but also tears down the underlying connection
    /// so a blocked reader on a cloned handle wakes up.
    pub(crate) fn close(&self) {
        self.alive.store(false, Ordering::SeqCst);
        let mut guard = self.lock_writer();
        if let Some(mut medium) = guard.take() {
            if let Err(err) = medium.shutdown() {
                debug!(endpoint = self.name, %err, "medium shutdown failed");
            }
        }
    }

    fn lock_writer(&self) -> MutexGuard<'_, Option<Box<dyn Medium>>> {
        // A poisoned lock only means a peer thread panicked mid-write; the
        // medium handle itself is still sound to close or replace.
        match self.writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::support::{RecordingMedium, TrickleMedium};

    #[test]
    fn write_fails_fast_when_not_alive() {
        let endpoint = Endpoint::new("socket");
        let err = endpoint.write(b"data").unwrap_err();
        assert!(matches!(err, RelayError::ChannelClosed("socket")));
    }

    #[test]
    fn write_goes_through_installed_medium() {
        let endpoint = Endpoint::new("serial");
        let medium = RecordingMedium::new();
        endpoint.install(Box::new(medium.clone()));

        let written = endpoint.write(b"hello").unwrap();
        assert_eq!(written, 5);
        assert_eq!(medium.concat(), b"hello");
    }

    #[test]
    fn take_offline_restores_fail_fast() {
        let endpoint = Endpoint::new("serial");
        endpoint.install(Box::new(RecordingMedium::new()));
        assert!(endpoint.is_alive());

        endpoint.take_offline();
        assert!(!endpoint.is_alive());
        assert!(matches!(
            endpoint.write(b"x").unwrap_err(),
            RelayError::ChannelClosed(_)
        ));
    }

    #[test]
    fn concurrent_writers_never_interleave() {
        // The trickle medium accepts one byte per write call, so without
        // the endpoint lock two writers would shuffle their bytes together.
        let endpoint = Arc::new(Endpoint::new("socket"));
        let medium = TrickleMedium::new();
        endpoint.install(Box::new(medium.clone()));

        let mut handles = Vec::new();
        for fill in [b'A', b'B', b'C'] {
            let endpoint = Arc::clone(&endpoint);
            handles.push(thread::spawn(move || {
                let message = [fill; 16];
                for _ in 0..50 {
                    endpoint.write(&message).unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let log = medium.concat();
        assert_eq!(log.len(), 3 * 50 * 16);
        for chunk in log.chunks(16) {
            assert!(
                chunk.iter().all(|byte| *byte == chunk[0]),
                "interleaved write observed: {chunk:?}"
            );
        }
    }

    #[test]
    fn close_is_idempotent() {
        let endpoint = Endpoint::new("socket");
        endpoint.install(Box::new(RecordingMedium::new()));
        endpoint.close();
        endpoint.close();
        assert!(!endpoint.is_alive());
    }
}
