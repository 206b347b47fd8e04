//! # Quota Module
//!
//! Per-user daily request counters kept in the shared key-value store.
//!
//! Counter keys embed the UTC calendar date, so a new day starts from zero
//! without any reset job; the 24h expiry only cleans up orphaned keys.
//! VIP users and administrators bypass counting altogether.
//!
//! Every store failure fails open.

/// The gate itself plus VIP management.
pub mod gate;

pub use gate::{next_reset, QuotaDecision, QuotaGate, GLOBAL_SCOPE};
