//! Currency conversion for price quotes. Best-effort: every failure is
//! logged and reported as "no rate".

use std::collections::HashMap;

use serde::Deserialize;
use tracing::debug;

use crate::retrieve::{FetchOptions, UpstreamFetcher};

#[derive(Debug, Deserialize)]
struct RatesResponse {
    #[serde(default)]
    rates: HashMap<String, f64>,
}

/// Client for a Frankfurter-style `/latest?from=&to=` endpoint.
#[derive(Debug, Clone)]
pub struct ExchangeRates {
    fetcher: UpstreamFetcher,
    base: String,
    opts: FetchOptions,
}

impl ExchangeRates {
    pub fn new(fetcher: UpstreamFetcher, base: impl Into<String>, opts: FetchOptions) -> Self {
        Self {
            fetcher,
            base: base.into(),
            opts,
        }
    }

    /// Units of `to` per one unit of `from`; `None` when the currencies match
    /// or the lookup fails.
    pub async fn rate(&self, from: &str, to: &str) -> Option<f64> {
        let (from, to) = (from.trim().to_uppercase(), to.trim().to_uppercase());
        if from.is_empty() || from == to {
            return None;
        }
        let url = format!("{}/latest?from={}&to={}", self.base.trim_end_matches('/'), from, to);
        match self.fetcher.fetch_json::<RatesResponse>(&url, self.opts).await {
            Ok(resp) => resp.rates.get(&to).copied().filter(|r| r.is_finite() && *r > 0.0),
            Err(e) => {
                debug!(%from, %to, error = %e, "exchange rate unavailable");
                None
            }
        }
    }
}
