//! # Data Retrieval Module
//!
//! This module provides the one HTTP primitive every upstream lookup goes
//! through: a bounded-timeout GET with a fixed number of extra attempts and
//! exponential backoff between them.
//!
//! ## Contained Modules:
//!
//! - **`ky_http`**: `UpstreamFetcher`, built on `reqwest`. There is no
//!   unbounded mode; each call carries a timeout because the chat transport
//!   that ultimately waits on us has a deadline of a few seconds.

/// Bounded-timeout HTTP GET with retry.
pub mod ky_http;

pub use ky_http::{FetchOptions, FetcherConfig, UpstreamFetcher};
