//! # Error Taxonomy
//!
//! One enum for every failure the router can observe. Store failures are
//! listed for completeness but are absorbed where they occur (caching is
//! skipped, quotas fail open); they only surface from explicit admin
//! operations such as VIP management.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors surfaced by the retrieval, cache and quota layers.
#[derive(Debug, Error)]
pub enum StoreBotError {
    /// The upstream did not answer within the configured bound.
    #[error("upstream timed out after {timeout_ms}ms: {url}")]
    UpstreamTimeout {
        /// Requested URL.
        url: String,
        /// Bound that was exceeded.
        timeout_ms: u64,
    },

    /// Non-2xx status or a transport failure (connect, TLS, reset).
    #[error("upstream request failed for {url} (status {status:?}): {message}")]
    UpstreamHttp {
        /// Requested URL.
        url: String,
        /// HTTP status when one was received.
        status: Option<u16>,
        /// Transport or server message.
        message: String,
    },

    /// The body arrived but could not be decoded into the expected shape.
    #[error("could not decode response from {url}: {message}")]
    UpstreamDecode {
        /// Requested URL.
        url: String,
        /// Decoder message.
        message: String,
    },

    /// The upstream answered with nothing usable.
    #[error("no data available from {source_name}")]
    UpstreamEmptyResult {
        /// Which lookup came back empty.
        source_name: &'static str,
    },

    /// The firmware manifest is absent or not a JSON object.
    #[error("firmware manifest malformed: {0}")]
    ManifestMalformed(String),

    /// The key-value store could not be reached.
    #[error("key-value store unavailable: {0}")]
    StoreUnavailable(String),

    /// The daily quota for this user and action is used up.
    #[error("daily limit of {limit} reached, resets at {reset_at}")]
    QuotaExceeded {
        /// The limit that was hit.
        limit: u32,
        /// Next UTC day boundary.
        reset_at: DateTime<Utc>,
    },

    /// A parameter the router resolved is not usable (unknown platform, bad region code).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An admin-only operation was attempted by someone else.
    #[error("user {0} is not an administrator")]
    Unauthorized(String),
}

impl StoreBotError {
    /// True for failures the router should render as "temporarily unavailable".
    pub fn is_temporarily_unavailable(&self) -> bool {
        matches!(
            self,
            StoreBotError::UpstreamTimeout { .. }
                | StoreBotError::UpstreamHttp { .. }
                | StoreBotError::UpstreamDecode { .. }
                | StoreBotError::StoreUnavailable(_)
        )
    }

    /// True for "nothing found" outcomes that must not be retried by the caller.
    pub fn is_no_data(&self) -> bool {
        matches!(
            self,
            StoreBotError::UpstreamEmptyResult { .. } | StoreBotError::ManifestMalformed(_)
        )
    }
}
