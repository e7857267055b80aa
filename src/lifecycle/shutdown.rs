//! Shutdown coordination for mesh processes.

use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// Every long-running server subscribes; one `trigger` stops them all.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Signal every subscriber. Safe to call with none left.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Subscribers that have not dropped their receiver yet.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
