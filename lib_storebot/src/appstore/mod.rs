//! # App Store Lookups
//!
//! Clients for the public App Store data sources and the normalization that
//! turns their heterogeneous payloads into the small shapes the bot renders.
//!
//! ## Contained Modules:
//!
//! - **`charts`**: top-N rankings with a legacy (rich, fragile) feed and a
//!   modern (lean, fast) fallback feed.
//! - **`search`**: the search endpoint behind price, detail and icon
//!   lookups, plus best-match selection.
//! - **`exchange`**: optional currency conversion for paid apps.
//! - **`format`**: price labels, byte sizes, artwork URLs and local dates.

/// Top-app rankings with two-tier failover.
pub mod charts;
/// Currency conversion for price quotes.
pub mod exchange;
/// Display helpers shared by the reports.
pub mod format;
/// Search endpoint client.
pub mod search;

pub use charts::{Chart, ChartEndpoints, ChartEntry, ChartKind, ChartOptions, ChartRetriever, ChartSource};
pub use exchange::ExchangeRates;
pub use search::{pick_best_match, AppRecord, AppSearch};

use crate::errors::StoreBotError;

/// Validates a two-letter storefront code and lower-cases it.
///
/// Region-name lookups happen in the router; by the time a request reaches
/// this layer it must already be an ISO country code.
pub fn normalize_region(code: &str) -> Result<String, StoreBotError> {
    let code = code.trim();
    if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code.to_ascii_lowercase())
    } else {
        Err(StoreBotError::InvalidInput(format!("unsupported region code: {code:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_codes_are_two_ascii_letters() {
        assert_eq!(normalize_region(" US ").unwrap(), "us");
        assert!(normalize_region("usa").is_err());
        assert!(normalize_region("").is_err());
        assert!(normalize_region("u1").is_err());
    }
}
