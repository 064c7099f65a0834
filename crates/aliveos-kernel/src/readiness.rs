//! [`ReadinessGate`] – one-time startup barrier.
//!
//! The coordinator must not send its first `Continue` signal to the Ego node
//! before Ego has announced itself.  Whoever observes readiness calls
//! [`ReadinessGate::mark_ready`]; the coordinator awaits
//! [`ReadinessGate::wait_ready`], which logs a warning on every poll interval
//! that elapses without the flag being set.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

/// Shared readiness flag.  Clone it freely; all clones observe the same flag.
#[derive(Clone, Debug)]
pub struct ReadinessGate {
    tx: watch::Sender<bool>,
}

impl ReadinessGate {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Set the flag.  Idempotent; returns `true` only for the call that
    /// actually flipped it.
    pub fn mark_ready(&self) -> bool {
        let flipped = self.tx.send_if_modified(|ready| {
            if *ready {
                false
            } else {
                *ready = true;
                true
            }
        });
        if flipped {
            info!("ego reported ready");
        }
        flipped
    }

    pub fn is_ready(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once the flag is set.
    pub async fn wait_ready(&self, poll_interval: Duration) {
        let mut rx = self.tx.subscribe();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            match tokio::time::timeout(poll_interval, rx.changed()).await {
                Ok(Ok(())) => continue,
                // The sender lives in `self`, so the channel cannot close here.
                Ok(Err(_)) => return,
                Err(_) => warn!("Ego is not ready yet!"),
            }
        }
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}
