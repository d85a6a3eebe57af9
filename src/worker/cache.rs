//! Time-boxed memo cache
//!
//! Entries are reused verbatim until their TTL elapses; nothing invalidates
//! them early.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

struct Entry<T> {
    value: T,
    expires_at: Instant,
}

/// Keyed cache with a single fixed TTL
pub struct TtlCache<T> {
    ttl: Duration,
    entries: RwLock<HashMap<String, Entry<T>>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Unexpired value for `key`
    pub async fn get(&self, key: &str) -> Option<T> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|e| Instant::now() < e.expires_at)
            .map(|e| e.value.clone())
    }

    /// Store `value`; a TTL too large for the clock stores an already-expired entry
    pub async fn insert(&self, key: impl Into<String>, value: T) {
        let now = Instant::now();
        let entry = Entry {
            value,
            expires_at: now.checked_add(self.ttl).unwrap_or(now),
        };
        self.entries.write().await.insert(key.into(), entry);
    }

    /// Drop expired entries, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        let now = Instant::now();
        entries.retain(|_, e| now < e.expires_at);
        before - entries.len()
    }
}
