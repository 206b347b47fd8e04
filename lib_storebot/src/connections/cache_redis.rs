//! # Redis Store Implementation
//!
//! Async Redis backend for [`KeyValueStore`]. The connection is opened lazily
//! on the first operation and shared through a `ConnectionManager`, which
//! reconnects on its own after transient failures. Every operation, including
//! the initial connect, is bounded by `op_timeout`.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisResult};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::kv_store::{KeyValueStore, StoreError};

/// A handler for Redis interactions.
pub struct RedisStore {
    /// The Redis client used to open the managed connection.
    client: Client,
    /// Lazily initialized managed connection.
    conn: OnceCell<ConnectionManager>,
    /// Upper bound for any single store round-trip.
    op_timeout: Duration,
}

impl RedisStore {
    /// Creates a store for `url` (e.g. "redis://127.0.0.1/").
    ///
    /// Only the URL is validated here; no network traffic happens until the
    /// first operation.
    pub fn new(url: &str, op_timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::open(url).map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Self {
            client,
            conn: OnceCell::new(),
            op_timeout,
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        let manager = self
            .conn
            .get_or_try_init(|| async {
                debug!("opening redis connection");
                self.bounded(self.client.get_connection_manager()).await
            })
            .await?;
        Ok(manager.clone())
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!(error = %e, "redis operation failed");
                Err(StoreError::Backend(e.to_string()))
            }
            Err(_) => {
                warn!(timeout = ?self.op_timeout, "redis operation timed out");
                Err(StoreError::Timeout(self.op_timeout))
            }
        }
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection().await?;
        self.bounded(conn.get::<_, Option<String>>(key)).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        match ttl {
            Some(ttl) => {
                let secs = ttl.as_secs().max(1);
                self.bounded(conn.set_ex::<_, _, ()>(key, value, secs)).await
            }
            None => self.bounded(conn.set::<_, _, ()>(key, value)).await,
        }
    }

    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        let mut conn = self.connection().await?;
        self.bounded(conn.incr::<_, _, i64>(key, 1i64)).await
    }

    async fn set_expiry(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let _: bool = self.bounded(conn.expire::<_, bool>(key, secs)).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let _: i64 = self.bounded(conn.del::<_, i64>(key)).await?;
        Ok(())
    }

    async fn key_count(&self) -> Result<u64, StoreError> {
        let mut conn = self.connection().await?;
        self.bounded(redis::cmd("DBSIZE").query_async::<u64>(&mut conn)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_url_without_connecting() {
        assert!(RedisStore::new("not a url", Duration::from_millis(50)).is_err());
    }

    #[tokio::test]
    async fn unreachable_server_is_a_store_error() {
        // Port 1 on loopback refuses connections immediately.
        let store = RedisStore::new("redis://127.0.0.1:1/", Duration::from_millis(300))
            .expect("valid url");
        assert!(store.get("anything").await.is_err());
        assert!(store.increment("counter").await.is_err());
    }
}
