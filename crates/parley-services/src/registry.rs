//! Peer registry — the single source of truth for who we are talking to.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::connection::Connection;

/// Identity of a peer as seen from this process: (IP, port). Inbound
/// connections start keyed by their ephemeral source port and move to
/// (IP, announced listen port) once the peer announces itself.
pub type PeerKey = SocketAddr;

/// Concurrency-safe map from `PeerKey` to its live connection.
///
/// Invariant: at most one live connection per key. Every operation is one
/// critical section under a single lock, and none of them performs I/O —
/// closing a superseded connection is a signal the owning handler acts on.
#[derive(Clone, Default)]
pub struct PeerRegistry {
    inner: Arc<Mutex<HashMap<PeerKey, Arc<Connection>>>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> MutexGuard<'_, HashMap<PeerKey, Arc<Connection>>> {
        // Nothing panics while holding this lock; recover rather than poison.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `conn` under `key`, closing any different connection the key
    /// previously held.
    pub fn insert(&self, key: PeerKey, conn: Arc<Connection>) {
        let prev = self.locked().insert(key, Arc::clone(&conn));
        if let Some(prev) = prev {
            if !Arc::ptr_eq(&prev, &conn) {
                tracing::debug!(peer = %key, "superseding existing connection");
                prev.close();
            }
        }
    }

    /// Remove `key` only if it still maps to `conn`, so a stale handler
    /// cannot delete an entry a re-key installed after it. Returns whether
    /// the entry was removed.
    pub fn remove(&self, key: PeerKey, conn: &Arc<Connection>) -> bool {
        let mut map = self.locked();
        match map.get(&key) {
            Some(current) if Arc::ptr_eq(current, conn) => {
                map.remove(&key);
                true
            }
            _ => false,
        }
    }

    /// Move `conn` from its provisional key to the key the peer announced,
    /// closing any different connection already registered there. One
    /// critical section, so concurrent lookups never see both keys live.
    pub fn rekey(&self, old: PeerKey, new: PeerKey, conn: &Arc<Connection>) {
        let mut map = self.locked();
        if let Some(current) = map.get(&old) {
            if Arc::ptr_eq(current, conn) {
                map.remove(&old);
            }
        }
        if let Some(evicted) = map.insert(new, Arc::clone(conn)) {
            if !Arc::ptr_eq(&evicted, conn) {
                tracing::debug!(peer = %new, "evicting connection superseded by re-key");
                evicted.close();
            }
        }
    }

    pub fn lookup(&self, key: PeerKey) -> Option<Arc<Connection>> {
        self.locked().get(&key).cloned()
    }

    /// Sorted list of currently registered peer keys.
    pub fn snapshot(&self) -> Vec<PeerKey> {
        let mut keys: Vec<PeerKey> = self.locked().keys().copied().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.locked().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locked().is_empty()
    }

    /// Close every registered connection and clear the map. Idempotent.
    pub fn close_all(&self) {
        let mut map = self.locked();
        for conn in map.values() {
            conn.close();
        }
        map.clear();
    }
}
