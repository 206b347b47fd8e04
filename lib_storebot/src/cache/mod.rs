//! # Cache Module
//!
//! Read-through memoization of upstream results in the shared key-value
//! store.
//!
//! ## Contained Modules:
//!
//! - **`keys`**: deterministic, schema-versioned cache keys.
//! - **`layer`**: the `with_cache` wrapper. A store outage degrades to a
//!   direct computation; it never fails the request.

/// Cache key construction and normalization.
pub mod keys;
/// The read-through wrapper.
pub mod layer;

pub use keys::{CacheCategory, CacheKey};
pub use layer::CacheLayer;
