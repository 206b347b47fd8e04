//! # Bot Settings
//!
//! Serde model of the JSON configuration file. Every field has a default, so
//! a partial file (or none at all) yields a working configuration.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BotSettings {
    /// `redis://` URL of the shared store. Unset means in-process memory.
    pub redis_url: Option<String>,
    /// Upper bound for any single store operation.
    pub store_timeout_ms: u64,
    pub log_level: String,
    /// IANA zone used for dates shown to users.
    pub display_timezone: String,
    /// Store ids that are listed but never linked.
    pub blocked_app_ids: Vec<String>,
    pub cache: CacheSettings,
    pub quota: QuotaSettings,
    pub upstream: UpstreamSettings,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            redis_url: None,
            store_timeout_ms: 1500,
            log_level: "info".to_string(),
            display_timezone: "Asia/Shanghai".to_string(),
            blocked_app_ids: Vec::new(),
            cache: CacheSettings::default(),
            quota: QuotaSettings::default(),
            upstream: UpstreamSettings::default(),
        }
    }
}

impl fmt::Display for BotSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BotSettings
    Store: {},
    Cache schema: {} (ttl {}s/{}s),
    Daily limit: {} ({} admins),
    Timezone: {},
    Log level: {}",
            if self.redis_url.is_some() { "redis" } else { "memory" },
            self.cache.schema_version,
            self.cache.short_ttl_secs,
            self.cache.long_ttl_secs,
            self.quota.daily_limit,
            self.quota.admin_ids.len(),
            self.display_timezone,
            self.log_level
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheSettings {
    /// Prefix of every cache key; bump it when a cached shape changes.
    pub schema_version: String,
    pub short_ttl_secs: u64,
    pub long_ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            schema_version: "v7".to_string(),
            short_ttl_secs: 600,
            long_ttl_secs: 1800,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuotaSettings {
    /// Per-user cap across all actions.
    pub daily_limit: u32,
    /// Per-action caps keyed by action name; missing actions fall back to
    /// `daily_limit`.
    pub action_limits: BTreeMap<String, u32>,
    pub admin_ids: Vec<String>,
    pub counter_ttl_secs: u64,
}

impl QuotaSettings {
    pub fn limit_for(&self, action: &str) -> u32 {
        self.action_limits.get(action).copied().unwrap_or(self.daily_limit)
    }
}

impl Default for QuotaSettings {
    fn default() -> Self {
        let action_limits = [("chart", 30), ("price", 30), ("detail", 30), ("icon", 20), ("os", 30)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        Self {
            daily_limit: 100,
            action_limits,
            admin_ids: Vec::new(),
            counter_ttl_secs: 86_400,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpstreamSettings {
    pub legacy_chart_base: String,
    pub modern_chart_base: String,
    pub search_base: String,
    pub manifest_url: String,
    pub exchange_base: String,
    pub user_agent: String,
    pub default_timeout_ms: u64,
    pub default_retries: u32,
    pub chart_primary_timeout_ms: u64,
    pub chart_fallback_timeout_ms: u64,
    pub chart_primary_retries: u32,
    pub chart_fallback_retries: u32,
    pub chart_limit: u32,
    pub search_timeout_ms: u64,
    pub manifest_timeout_ms: u64,
    pub probe_timeout_ms: u64,
    pub exchange_timeout_ms: u64,
    /// The firmware host's chain is not in the default trust store.
    pub accept_invalid_manifest_certs: bool,
    /// Currency paid prices are converted into.
    pub home_currency: String,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            legacy_chart_base: "https://itunes.apple.com".to_string(),
            modern_chart_base: "https://rss.marketingtools.apple.com".to_string(),
            search_base: "https://itunes.apple.com".to_string(),
            manifest_url: "https://gdmf.apple.com/v2/pmv".to_string(),
            exchange_base: "https://api.frankfurter.app".to_string(),
            user_agent: "Mozilla/5.0 (StoreBot)".to_string(),
            default_timeout_ms: 6000,
            default_retries: 1,
            chart_primary_timeout_ms: 2500,
            chart_fallback_timeout_ms: 3000,
            chart_primary_retries: 0,
            chart_fallback_retries: 0,
            chart_limit: 10,
            search_timeout_ms: 4000,
            manifest_timeout_ms: 4000,
            probe_timeout_ms: 2000,
            exchange_timeout_ms: 3000,
            accept_invalid_manifest_certs: true,
            home_currency: "CNY".to_string(),
        }
    }
}
