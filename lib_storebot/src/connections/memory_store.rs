//! # In-Memory Store
//!
//! A process-local [`KeyValueStore`] with real TTL semantics. Expiry uses
//! `tokio::time::Instant`, so tests can pause and advance time. The
//! availability switch makes every operation fail with
//! [`StoreError::Backend`], standing in for an unreachable Redis.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::kv_store::{KeyValueStore, StoreError};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// Map-backed store for tests and single-process runs.
#[derive(Debug)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty, reachable store.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Creates a store that rejects every operation.
    pub fn unavailable() -> Self {
        let store = Self::new();
        store.set_available(false);
        store
    }

    /// Toggles simulated outages.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Drops expired entries so keys that are never read again do not pile up.
    fn prune(entries: &mut HashMap<String, Entry>, now: Instant) {
        entries.retain(|_, entry| entry.is_live(now));
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Backend("memory store marked unavailable".to_string()))
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check()?;
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        self.check()?;
        let now = Instant::now();
        let expires_at = ttl.map(|ttl| now + ttl);
        let mut entries = self.entries.lock().await;
        Self::prune(&mut entries, now);
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        self.check()?;
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        Self::prune(&mut entries, now);
        let live = entries.get(key).cloned();
        let (current, expires_at) = match live {
            Some(entry) => {
                let parsed = entry.value.parse::<i64>().map_err(|e| StoreError::Corrupt {
                    key: key.to_string(),
                    message: e.to_string(),
                })?;
                (parsed, entry.expires_at)
            }
            None => (0, None),
        };
        let next = current + 1;
        entries.insert(
            key.to_string(),
            Entry {
                value: next.to_string(),
                expires_at,
            },
        );
        Ok(next)
    }

    async fn set_expiry(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        self.check()?;
        if let Some(entry) = self.entries.lock().await.get_mut(key) {
            entry.expires_at = Some(Instant::now() + ttl);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.check()?;
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn key_count(&self) -> Result<u64, StoreError> {
        self.check()?;
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        Self::prune(&mut entries, now);
        Ok(entries.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test(start_paused = true)]
    async fn values_expire_after_ttl() {
        let store = MemoryStore::new();
        store.set("k", "v", Some(Duration::from_secs(10))).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
        assert_eq!(store.key_count().await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn writes_drop_expired_entries_never_read_again() {
        let store = MemoryStore::new();
        for day in ["2025-12-29", "2025-12-30"] {
            store.set(&format!("limit:os:{day}:u1"), "3", Some(Duration::from_secs(60))).await.unwrap();
        }
        store.set("v7:chart:us:free", "[]", Some(Duration::from_secs(30))).await.unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;
        store.increment("limit:os:2025-12-31:u1").await.unwrap();

        let keys: Vec<String> = store.entries.lock().await.keys().cloned().collect();
        assert_eq!(keys, vec!["limit:os:2025-12-31:u1".to_string()]);
    }

    #[tokio::test]
    async fn increment_starts_from_zero_and_keeps_expiry() {
        let store = MemoryStore::new();
        assert_eq!(store.increment("c").await.unwrap(), 1);
        store.set_expiry("c", Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.increment("c").await.unwrap(), 2);
        assert_eq!(store.get("c").await.unwrap(), Some("2".to_string()));
    }

    #[tokio::test]
    async fn increment_rejects_non_numeric_values() {
        let store = MemoryStore::new();
        store.set("c", "abc", None).await.unwrap();
        assert!(matches!(store.increment("c").await, Err(StoreError::Corrupt { .. })));
    }

    #[tokio::test]
    async fn unavailable_store_fails_every_operation() {
        let store = MemoryStore::unavailable();
        assert!(store.get("k").await.is_err());
        assert!(store.set("k", "v", None).await.is_err());
        assert!(store.increment("k").await.is_err());
        assert!(store.delete("k").await.is_err());

        store.set_available(true);
        assert!(store.get("k").await.is_ok());
    }
}
