//! # Firmware Release Catalog
//!
//! Turns the firmware manifest (the OS-update source's catalog document) into
//! normalized, deduplicated and classified release lists per platform.
//!
//! ## Contained Modules:
//!
//! - **`platform`**: the six OS platforms, alias normalization and the pure
//!   device-identifier classifier.
//! - **`catalog`**: the manifest scan, stability heuristic and the
//!   latest-first ordering used to pick "latest" and "recent history".
//! - **`manifest`**: fetching the manifest document itself.

/// OS platforms and device-identifier classification.
pub mod platform;
/// Manifest scanning and release ordering.
pub mod catalog;
/// Manifest download.
pub mod manifest;

pub use catalog::{collect_releases, compare_versions, sort_latest_first, Release, Stability};
pub use manifest::ManifestSource;
pub use platform::{classify_devices, Platform};
