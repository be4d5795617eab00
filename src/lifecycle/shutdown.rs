//! Stop signal for the AI service's background tasks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Fan-out stop signal. Clones share the same signal.
///
/// Only the first `trigger` broadcasts; later calls are no-ops.
#[derive(Debug, Clone)]
pub struct Shutdown {
    sender: broadcast::Sender<()>,
    fired: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self {
            sender,
            fired: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Receiver for a background task; resolves once `trigger` fires.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.sender.subscribe()
    }

    /// Stop every subscribed task. Returns how many tasks were notified.
    pub fn trigger(&self) -> usize {
        if self.fired.swap(true, Ordering::AcqRel) {
            return 0;
        }
        let notified = self.sender.send(()).unwrap_or(0);
        tracing::info!(tasks = notified, "AI background tasks stopping");
        notified
    }

    pub fn is_triggered(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Tasks still holding a receiver.
    pub fn subscribers(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
