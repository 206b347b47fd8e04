//! # Read-Through Cache
//!
//! `with_cache` returns a live cached value when one exists and otherwise
//! runs the computation, storing successful results for `ttl`.
//!
//! Store failures are absorbed: a failed read runs the computation and skips
//! the write, a failed write is logged and the fresh value is returned.
//! Errors from the computation are returned unchanged and never cached.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::keys::CacheKey;
use crate::connections::KeyValueStore;

/// Read-through cache over the shared key-value store.
#[derive(Clone)]
pub struct CacheLayer {
    store: Arc<dyn KeyValueStore>,
}

impl CacheLayer {
    /// Wraps the injected store.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Returns the live value stored under `key`, or runs `compute` and
    /// stores its `Ok` result as JSON for `ttl`.
    ///
    /// # Errors
    /// Only those of `compute`; store failures are logged and absorbed.
    pub async fn with_cache<T, E, F, Fut>(&self, key: &CacheKey, ttl: Duration, compute: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = key.as_str();
        let store_reachable = match self.store.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(value) => {
                    debug!(key, "cache hit");
                    return Ok(value);
                }
                Err(e) => {
                    // Stale layout or foreign writer; recompute and overwrite.
                    warn!(key, error = %e, "discarding undecodable cache entry");
                    true
                }
            },
            Ok(None) => {
                debug!(key, "cache miss");
                true
            }
            Err(e) => {
                warn!(key, error = %e, "cache read failed, computing directly");
                false
            }
        };

        let value = compute().await?;

        if store_reachable {
            match serde_json::to_string(&value) {
                Ok(raw) => {
                    if let Err(e) = self.store.set(key, &raw, Some(ttl)).await {
                        warn!(key, error = %e, "cache write failed");
                    }
                }
                Err(e) => warn!(key, error = %e, "value not serializable, not cached"),
            }
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheCategory;
    use crate::connections::MemoryStore;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn key() -> CacheKey {
        CacheKey::new("v7", CacheCategory::Chart).part("us").part("free")
    }

    async fn counted(calls: &AtomicU32, value: u32) -> Result<u32, String> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    }

    #[tokio::test(start_paused = true)]
    async fn computes_once_within_ttl_and_again_after() {
        let store = Arc::new(MemoryStore::new());
        let cache = CacheLayer::new(store);
        let calls = AtomicU32::new(0);
        let ttl = Duration::from_secs(600);

        assert_eq!(cache.with_cache(&key(), ttl, || counted(&calls, 1)).await, Ok(1));
        assert_eq!(cache.with_cache(&key(), ttl, || counted(&calls, 2)).await, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(601)).await;
        assert_eq!(cache.with_cache(&key(), ttl, || counted(&calls, 3)).await, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unavailable_store_computes_every_time() {
        let cache = CacheLayer::new(Arc::new(MemoryStore::unavailable()));
        let calls = AtomicU32::new(0);
        for i in 0..3 {
            assert_eq!(cache.with_cache(&key(), Duration::from_secs(60), || counted(&calls, i)).await, Ok(i));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn errors_are_returned_and_not_cached() {
        let store = Arc::new(MemoryStore::new());
        let cache = CacheLayer::new(store.clone());
        let ttl = Duration::from_secs(60);

        let failed: Result<u32, String> = cache.with_cache(&key(), ttl, || async { Err("upstream down".to_string()) }).await;
        assert_eq!(failed, Err("upstream down".to_string()));
        assert_eq!(store.get(key().as_str()).await.unwrap(), None);

        let calls = AtomicU32::new(0);
        assert_eq!(cache.with_cache(&key(), ttl, || counted(&calls, 5)).await, Ok(5));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn undecodable_entries_are_recomputed() {
        let store = Arc::new(MemoryStore::new());
        store.set(key().as_str(), "not json", None).await.unwrap();
        let cache = CacheLayer::new(store.clone());
        let calls = AtomicU32::new(0);

        assert_eq!(cache.with_cache(&key(), Duration::from_secs(60), || counted(&calls, 9)).await, Ok(9));
        assert_eq!(store.get(key().as_str()).await.unwrap().as_deref(), Some("9"));
    }
}
