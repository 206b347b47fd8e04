//! # Key-Value Store Contract
//!
//! The operations the bot needs from its shared store. Every method may fail
//! with [`StoreError`]; callers decide locally whether that means "skip the
//! cache" or "allow the request".

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::errors::StoreBotError;

/// The store could not serve the operation.
#[derive(Debug, Error, Clone)]
pub enum StoreError {
    /// Connecting or talking to the backend failed.
    #[error("store backend error: {0}")]
    Backend(String),

    /// The operation did not finish inside the configured bound.
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),

    /// The backend returned a value of an unexpected type.
    #[error("unexpected value for key {key}: {message}")]
    Corrupt {
        /// Affected key.
        key: String,
        /// What was wrong with it.
        message: String,
    },
}

impl From<StoreError> for StoreBotError {
    fn from(err: StoreError) -> Self {
        StoreBotError::StoreUnavailable(err.to_string())
    }
}

/// Async key-value operations on string keys and values.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the live value for `key`, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value`; `ttl = None` keeps it until deleted.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError>;

    /// Atomically adds one and returns the new value (absent counts as 0).
    async fn increment(&self, key: &str) -> Result<i64, StoreError>;

    /// Sets or refreshes the expiry of an existing key.
    async fn set_expiry(&self, key: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Removes `key`; removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Number of keys currently held, for the admin status report.
    async fn key_count(&self) -> Result<u64, StoreError>;
}
