//! # Services Module
//!
//! The router-facing layer. A request enters through
//! [`StoreBot::handle`](bot::StoreBot::handle), is charged against the
//! user's quota, and is answered from cache or from the upstream clients.
//!
//! ## Contained Modules:
//!
//! - **`requests`**: typed, validated user requests.
//! - **`reports`**: display-ready results.
//! - **`bot`**: the composition of quota, cache and upstream clients.

/// The service itself.
pub mod bot;
/// Display-ready results.
pub mod reports;
/// Typed user requests.
pub mod requests;

pub use bot::{open_store, StoreBot};
pub use reports::ActionReply;
pub use requests::ActionRequest;
