use std::sync::{Arc, Condvar, Mutex};

use tracing::debug;

use crate::endpoint::Endpoint;

/// One-shot publication of a channel's peer endpoint.
///
/// The coordinator publishes exactly once during wiring; each channel
/// waits on its slot before processing any data. This is the startup
/// barrier: no frame is ever written toward a channel that does not yet
/// exist, regardless of how the two threads get scheduled.
pub struct PeerSlot {
    slot: Mutex<Option<Arc<Endpoint>>>,
    ready: Condvar,
}

impl PeerSlot {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    /// Publish the peer endpoint. Later calls are ignored: a channel's
    /// peer reference is established once and never reassigned.
    pub fn publish(&self, peer: Arc<Endpoint>) {
        let mut guard = self.lock();
        if guard.is_some() {
            debug!(peer = peer.name(), "peer already published, ignoring");
            return;
        }
        *guard = Some(peer);
        drop(guard);
        self.ready.notify_all();
    }

    /// Block until the peer endpoint has been published.
    pub fn wait(&self) -> Arc<Endpoint> {
        let mut guard = self.lock();
        loop {
            if let Some(peer) = guard.as_ref() {
                return Arc::clone(peer);
            }
            guard = match self.ready.wait(guard) {
                Ok(next) => next,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
    }

    /// Non-blocking read of the slot.
    pub fn get(&self) -> Option<Arc<Endpoint>> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Arc<Endpoint>>> {
        match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for PeerSlot {
    fn default() -> Self {
        Self::new()
    }
}
