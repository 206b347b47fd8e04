//! # HTTP Retrieval Utilities
//!
//! An asynchronous GET client wrapper around `reqwest`. Each call is bounded
//! by a timeout and retried a fixed number of times with exponential backoff
//! (250ms, 500ms, ...). When every attempt fails, the last error is returned.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::errors::StoreBotError;

/// First backoff delay; doubles on every further attempt.
const BACKOFF_BASE_MS: u64 = 250;

/// Per-call bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Bound for one attempt, from connect until the body is read.
    pub timeout: Duration,
    /// Additional attempts after the first one.
    pub retries: u32,
}

impl FetchOptions {
    /// Builds options from a millisecond timeout and a retry count.
    pub fn new(timeout_ms: u64, retries: u32) -> Self {
        Self {
            timeout: Duration::from_millis(timeout_ms),
            retries,
        }
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::new(6000, 1)
    }
}

/// Construction parameters for [`UpstreamFetcher`].
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// User-Agent header sent with every request.
    pub user_agent: String,
    /// Skip TLS certificate validation (needed for the firmware manifest host).
    pub accept_invalid_certs: bool,
    /// Options used by callers that have no specific requirement.
    pub defaults: FetchOptions,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (StoreBot)".to_string(),
            accept_invalid_certs: false,
            defaults: FetchOptions::default(),
        }
    }
}

/// A GET-only client with bounded retries.
#[derive(Debug, Clone)]
pub struct UpstreamFetcher {
    /// The underlying reqwest client; cheap to clone, pools connections.
    inner: reqwest::Client,
    defaults: FetchOptions,
}

impl UpstreamFetcher {
    /// Creates a fetcher.
    ///
    /// # Errors
    /// Returns `UpstreamHttp` if the TLS backend cannot be initialised.
    pub fn new(config: FetcherConfig) -> Result<Self, StoreBotError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));

        let inner = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .default_headers(headers)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| StoreBotError::UpstreamHttp {
                url: String::new(),
                status: None,
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            inner,
            defaults: config.defaults,
        })
    }

    /// The options this fetcher was configured with.
    pub fn defaults(&self) -> FetchOptions {
        self.defaults
    }

    /// Fetches `url` and returns the raw body.
    ///
    /// Non-2xx statuses, transport errors and timeouts are all retried.
    pub async fn fetch(&self, url: &str, opts: FetchOptions) -> Result<String, StoreBotError> {
        let attempts = opts.retries.saturating_add(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.fetch_once(url, opts).await {
                Ok(body) => {
                    debug!(url, attempt, "upstream fetch succeeded");
                    return Ok(body);
                }
                Err(err) if attempt < attempts => {
                    let delay = backoff_delay(attempt);
                    warn!(url, attempt, attempts, error = %err, ?delay, "upstream fetch failed, retrying");
                    sleep(delay).await;
                }
                Err(err) => {
                    warn!(url, attempts, error = %err, "upstream fetch exhausted retries");
                    return Err(err);
                }
            }
        }
    }

    /// Fetches `url` and decodes the body as JSON.
    ///
    /// Decode failures are not retried; the body did arrive.
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: &str,
        opts: FetchOptions,
    ) -> Result<T, StoreBotError> {
        let body = self.fetch(url, opts).await?;
        serde_json::from_str(&body).map_err(|e| StoreBotError::UpstreamDecode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// Issues a single HEAD request and reports whether it answered 2xx in time.
    pub async fn probe(&self, url: &str, timeout: Duration) -> bool {
        match self.inner.head(url).timeout(timeout).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!(url, error = %e, "probe failed");
                false
            }
        }
    }

    async fn fetch_once(&self, url: &str, opts: FetchOptions) -> Result<String, StoreBotError> {
        let response = self
            .inner
            .get(url)
            .timeout(opts.timeout)
            .send()
            .await
            .map_err(|e| map_transport_error(url, opts, e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreBotError::UpstreamHttp {
                url: url.to_string(),
                status: Some(status.as_u16()),
                message: truncate(&message, 200),
            });
        }

        response
            .text()
            .await
            .map_err(|e| map_transport_error(url, opts, e))
    }
}

/// Pause after failed attempt `attempt` (1-based): 250ms, then doubling.
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(BACKOFF_BASE_MS << attempt.saturating_sub(1).min(16))
}

fn map_transport_error(url: &str, opts: FetchOptions, err: reqwest::Error) -> StoreBotError {
    if err.is_timeout() {
        StoreBotError::UpstreamTimeout {
            url: url.to_string(),
            timeout_ms: opts.timeout_ms(),
        }
    } else {
        StoreBotError::UpstreamHttp {
            url: url.to_string(),
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
