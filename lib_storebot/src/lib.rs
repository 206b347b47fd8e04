//! # lib_storebot
//!
//! The retrieval, normalization, caching and quota-gating layer that sits
//! between the chat router and Apple's public data sources (chart feeds, the
//! search endpoint and the firmware manifest).
//!
//! Every folder is a cargo feature so binaries can pull in only what they
//! need; `full` (the default) enables all of them.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

/// Error taxonomy shared by every module.
pub mod errors;

/// Layered settings: defaults, JSON file and environment overrides.
#[cfg(feature = "configs")]
pub mod configs;

/// Key-value store abstraction with Redis and in-memory backends.
#[cfg(feature = "connections")]
pub mod connections;

/// Tracing subscriber bootstrap for binaries.
#[cfg(feature = "loggers")]
pub mod loggers;

/// Bounded-timeout HTTP GET with retry.
#[cfg(feature = "retrieve")]
pub mod retrieve;

/// App Store charts and search-based lookups.
#[cfg(feature = "appstore")]
pub mod appstore;

/// OS release catalog built from the firmware manifest.
#[cfg(feature = "firmware")]
pub mod firmware;

/// TTL memoization backed by the key-value store.
#[cfg(feature = "cache")]
pub mod cache;

/// Per-user daily quotas with VIP and admin bypass.
#[cfg(feature = "quota")]
pub mod quota;

/// Router-facing actions.
#[cfg(feature = "services")]
pub mod services;

pub use errors::StoreBotError;
