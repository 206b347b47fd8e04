//! # Connections Module
//!
//! This module handles the key-value store the bot shares across requests.
//! The store is the only mutable state outside a single request; callers
//! receive it as an injected `Arc<dyn KeyValueStore>`, never as a global.

/// The store contract and its error type.
pub mod kv_store;

/// Module for Redis cache operations and connection handling.
pub mod cache_redis;

/// In-process store used by tests and Redis-less local runs.
pub mod memory_store;

pub use cache_redis::RedisStore;
pub use kv_store::{KeyValueStore, StoreError};
pub use memory_store::MemoryStore;
