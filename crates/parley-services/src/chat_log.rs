//! In-memory chat history.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

/// One chat line. Entries are append-only; nothing mutates them afterward.
#[derive(Debug, Clone, Serialize)]
pub struct ChatEntry {
    /// Display label of the sender, "<host>:<port>" for remote peers.
    pub sender: String,
    pub text: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

/// Shared append-only chat log, guarded by its own lock.
#[derive(Clone, Default)]
pub struct ChatLog {
    entries: Arc<Mutex<Vec<ChatEntry>>>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> MutexGuard<'_, Vec<ChatEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a message in arrival order.
    pub fn append(&self, sender: impl Into<String>, text: impl Into<String>) {
        let entry = ChatEntry {
            sender: sender.into(),
            text: text.into(),
            timestamp: now_millis(),
        };
        self.locked().push(entry);
    }

    /// Copy of the full history, oldest first.
    pub fn snapshot(&self) -> Vec<ChatEntry> {
        self.locked().clone()
    }

    pub fn len(&self) -> usize {
        self.locked().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locked().is_empty()
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
