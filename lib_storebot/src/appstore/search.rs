//! # Search Client
//!
//! Wraps the App Store search endpoint used for price, detail and icon
//! lookups. Only the fields the reports need are decoded; everything is
//! optional because the endpoint omits fields freely.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::errors::StoreBotError;
use crate::retrieve::{FetchOptions, UpstreamFetcher};

/// One search hit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppRecord {
    pub track_id: Option<u64>,
    pub track_name: String,
    pub track_view_url: String,
    pub price: Option<f64>,
    pub formatted_price: Option<String>,
    pub currency: Option<String>,
    pub artwork_url60: Option<String>,
    pub artwork_url100: Option<String>,
    pub artwork_url512: Option<String>,
    pub average_user_rating: Option<f64>,
    /// Sent as a decimal string by the endpoint, occasionally as a number.
    #[serde(deserialize_with = "lenient_u64")]
    pub file_size_bytes: Option<u64>,
    pub version: Option<String>,
    pub minimum_os_version: Option<String>,
    pub current_version_release_date: Option<String>,
    pub release_date: Option<String>,
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SearchResponse {
    result_count: u32,
    results: Vec<AppRecord>,
}

/// Exact case-insensitive name match, else the first name containing the
/// query, else the first result.
pub fn pick_best_match<'a>(query: &str, results: &'a [AppRecord]) -> Option<&'a AppRecord> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return results.first();
    }
    results
        .iter()
        .find(|r| r.track_name.to_lowercase() == q)
        .or_else(|| results.iter().find(|r| r.track_name.to_lowercase().contains(&q)))
        .or_else(|| results.first())
}

/// Search endpoint client.
#[derive(Debug, Clone)]
pub struct AppSearch {
    fetcher: UpstreamFetcher,
    base: String,
    opts: FetchOptions,
    limit: u32,
}

impl AppSearch {
    pub fn new(fetcher: UpstreamFetcher, base: impl Into<String>, opts: FetchOptions, limit: u32) -> Self {
        Self {
            fetcher,
            base: base.into(),
            opts,
            limit: limit.max(1),
        }
    }

    /// Returns the best match for `term` in storefront `country`, or `None`
    /// when the endpoint found nothing.
    pub async fn find(&self, term: &str, country: &str) -> Result<Option<AppRecord>, StoreBotError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(StoreBotError::InvalidInput("empty search term".to_string()));
        }

        let endpoint = format!("{}/search", self.base.trim_end_matches('/'));
        let limit = self.limit.to_string();
        let url = Url::parse_with_params(
            &endpoint,
            &[
                ("term", term),
                ("entity", "software"),
                ("country", country),
                ("limit", limit.as_str()),
            ],
        )
        .map_err(|e| StoreBotError::InvalidInput(format!("bad search endpoint {endpoint}: {e}")))?;

        let response: SearchResponse = self.fetcher.fetch_json(url.as_str(), self.opts).await?;
        debug!(term, country, count = response.result_count, "search completed");
        Ok(pick_best_match(term, &response.results).cloned())
    }
}
