//! Background task lifecycle.
//!
//! The security service owns long-lived timers (audit batch export). They
//! must stop when the host shuts down instead of running for the process
//! lifetime, so every spawned task subscribes to this coordinator.

use tokio::sync::broadcast;

/// Broadcast-based shutdown coordinator for security background tasks.
///
/// Hosts create one, pass it to [`crate::service::SecurityService::start`],
/// and call [`trigger`](Self::trigger) on their own shutdown path. Tasks
/// observe the signal and drain before exiting.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe a background task to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Signal every subscribed task to stop. Safe to call more than once;
    /// with no subscribers it is a no-op.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Tasks still subscribed (not yet exited).
    pub fn active_tasks(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
