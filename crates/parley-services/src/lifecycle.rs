//! Process-wide shutdown signal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

/// Shutdown flag set exactly once, observed by every loop in the process.
///
/// Wraps a broadcast channel so waiters wake as soon as the flag is set; the
/// flag itself makes `signalled` resolve immediately for tasks that start
/// (or subscribe) after shutdown already began.
#[derive(Clone)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            tx,
        }
    }

    /// Set the flag and wake all waiters. Idempotent.
    pub fn trigger(&self) {
        if !self.flag.swap(true, Ordering::AcqRel) {
            let _ = self.tx.send(());
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Resolves once shutdown has been triggered, immediately if it already
    /// was.
    pub async fn signalled(&self) {
        // Subscribe before checking the flag so a concurrent trigger cannot
        // slip between the check and the wait.
        let mut rx = self.tx.subscribe();
        if self.is_triggered() {
            return;
        }
        let _ = rx.recv().await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
