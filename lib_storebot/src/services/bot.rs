//! # StoreBot
//!
//! Composes quota, cache and the upstream clients into the actions the
//! router calls. `handle` is the single entry point for user traffic: it
//! validates the request, charges the two-tier quota and only then touches
//! the cache or the network.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use chrono_tz::Tz;
use tracing::{debug, info, warn};

use super::reports::{
    ActionReply, AdminStatus, AppDetail, AppIcon, ChartLine, ChartReport, OsDetail, OsSummary, OsSummaryLine,
    PriceQuote, ReleaseLine,
};
use super::requests::ActionRequest;
use crate::appstore::format::{display_zone, format_bytes, high_res_artwork, local_ymd, parse_store_date, price_label};
use crate::appstore::{AppRecord, AppSearch, ChartEndpoints, ChartKind, ChartOptions, ChartRetriever, ExchangeRates};
use crate::cache::{CacheCategory, CacheKey, CacheLayer};
use crate::configs::{BotSettings, QuotaSettings};
use crate::connections::{KeyValueStore, MemoryStore, RedisStore, StoreError};
use crate::errors::StoreBotError;
use crate::firmware::{collect_releases, sort_latest_first, ManifestSource, Platform, Release};
use crate::quota::QuotaGate;
use crate::retrieve::{FetchOptions, FetcherConfig, UpstreamFetcher};

/// Storefront used for detail and icon lookups.
const LOOKUP_REGION: &str = "us";
/// History length of the OS detail report.
const RECENT_RELEASES: usize = 5;

/// Opens the configured store: Redis when a URL is set, otherwise an
/// in-process map.
pub fn open_store(settings: &BotSettings) -> Result<Arc<dyn KeyValueStore>, StoreError> {
    match settings.redis_url.as_deref().filter(|u| !u.trim().is_empty()) {
        Some(url) => {
            let store = RedisStore::new(url, Duration::from_millis(settings.store_timeout_ms))?;
            info!("using redis store");
            Ok(Arc::new(store))
        }
        None => {
            info!("no redis url configured, using in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

pub struct StoreBot {
    store: Arc<dyn KeyValueStore>,
    cache: CacheLayer,
    quota: QuotaGate,
    limits: QuotaSettings,
    charts: ChartRetriever,
    search: AppSearch,
    rates: ExchangeRates,
    manifest: ManifestSource,
    fetcher: UpstreamFetcher,
    schema: String,
    short_ttl: Duration,
    long_ttl: Duration,
    probe_timeout: Duration,
    home_currency: String,
    blocked: HashSet<String>,
    zone: Tz,
}

impl StoreBot {
    /// Builds every client from `settings`. The store is injected so tests
    /// and binaries decide what backs it.
    pub fn from_settings(settings: &BotSettings, store: Arc<dyn KeyValueStore>) -> Result<Self, StoreBotError> {
        let up = &settings.upstream;
        let fetcher = UpstreamFetcher::new(FetcherConfig {
            user_agent: up.user_agent.clone(),
            accept_invalid_certs: false,
            defaults: FetchOptions::new(up.default_timeout_ms, up.default_retries),
        })?;
        let manifest_fetcher = UpstreamFetcher::new(FetcherConfig {
            user_agent: up.user_agent.clone(),
            accept_invalid_certs: up.accept_invalid_manifest_certs,
            defaults: FetchOptions::new(up.manifest_timeout_ms, up.default_retries),
        })?;

        let charts = ChartRetriever::new(
            fetcher.clone(),
            ChartEndpoints {
                legacy_base: up.legacy_chart_base.clone(),
                modern_base: up.modern_chart_base.clone(),
            },
            ChartOptions {
                primary: FetchOptions::new(up.chart_primary_timeout_ms, up.chart_primary_retries),
                fallback: FetchOptions::new(up.chart_fallback_timeout_ms, up.chart_fallback_retries),
                limit: up.chart_limit,
            },
        );
        let search = AppSearch::new(
            fetcher.clone(),
            up.search_base.clone(),
            FetchOptions::new(up.search_timeout_ms, up.default_retries),
            1,
        );
        let rates = ExchangeRates::new(
            fetcher.clone(),
            up.exchange_base.clone(),
            FetchOptions::new(up.exchange_timeout_ms, 0),
        );
        let manifest_opts = manifest_fetcher.defaults();
        let manifest = ManifestSource::new(manifest_fetcher, up.manifest_url.clone(), manifest_opts);

        Ok(Self {
            cache: CacheLayer::new(store.clone()),
            quota: QuotaGate::new(
                store.clone(),
                settings.quota.admin_ids.iter().cloned(),
                Duration::from_secs(settings.quota.counter_ttl_secs),
            ),
            store,
            limits: settings.quota.clone(),
            charts,
            search,
            rates,
            manifest,
            fetcher,
            schema: settings.cache.schema_version.clone(),
            short_ttl: Duration::from_secs(settings.cache.short_ttl_secs),
            long_ttl: Duration::from_secs(settings.cache.long_ttl_secs),
            probe_timeout: Duration::from_millis(up.probe_timeout_ms),
            home_currency: up.home_currency.to_uppercase(),
            blocked: settings.blocked_app_ids.iter().map(|s| s.trim().to_string()).collect(),
            zone: display_zone(&settings.display_timezone),
        })
    }

    pub fn quota(&self) -> &QuotaGate {
        &self.quota
    }

    /// Runs one user request end to end.
    ///
    /// # Errors
    /// `InvalidInput` before any quota is charged, `QuotaExceeded` before any
    /// upstream call, then whatever the action itself reports.
    pub async fn handle(&self, user_id: &str, request: ActionRequest) -> Result<ActionReply, StoreBotError> {
        let request = request.normalized()?;
        let action = request.action();
        self.quota
            .check_two_tier(user_id, self.limits.daily_limit, action, self.limits.limit_for(action))
            .await
            .into_result()?;
        debug!(user = user_id, action, "quota passed");

        match request {
            ActionRequest::Chart { region, kind } => self.chart(&region, kind).await.map(ActionReply::Chart),
            ActionRequest::Price { app, region } => self.price(&app, &region).await.map(ActionReply::Price),
            ActionRequest::Detail { app } => self.detail(&app).await.map(ActionReply::Detail),
            ActionRequest::Icon { app } => self.icon(&app).await.map(ActionReply::Icon),
            ActionRequest::OsSummary => self.os_summary().await.map(ActionReply::OsSummary),
            ActionRequest::OsDetail { platform } => self.os_detail(platform).await.map(ActionReply::OsDetail),
        }
    }

    pub async fn chart(&self, region: &str, kind: ChartKind) -> Result<ChartReport, StoreBotError> {
        let key = self.key(CacheCategory::Chart).part(region).part(kind.as_str());
        let chart = self
            .cache
            .with_cache(&key, self.short_ttl, || self.charts.get_chart(region, kind))
            .await?;

        let lines = chart
            .entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| ChartLine {
                rank: i + 1,
                link: self.link_for(&entry.id, Some(entry.store_url)),
                name: entry.name,
            })
            .collect();
        Ok(ChartReport {
            region: chart.region,
            kind: chart.kind,
            source: chart.source,
            lines,
        })
    }

    pub async fn price(&self, app: &str, region: &str) -> Result<PriceQuote, StoreBotError> {
        let key = self.key(CacheCategory::Price).part(region).term(app);
        let mut quote = self
            .cache
            .with_cache(&key, self.short_ttl, || async move {
                let record = self.lookup(app, region).await?;
                let estimate = self.estimate(&record).await;
                Ok::<_, StoreBotError>(PriceQuote {
                    query: app.to_string(),
                    app_id: app_id(&record),
                    label: price_label(&record),
                    name: record.track_name,
                    store_url: Some(record.track_view_url),
                    region: region.to_string(),
                    estimate,
                })
            })
            .await?;
        quote.store_url = self.link_for(&quote.app_id, quote.store_url.take());
        Ok(quote)
    }

    pub async fn detail(&self, app: &str) -> Result<AppDetail, StoreBotError> {
        let key = self.key(CacheCategory::Detail).part(LOOKUP_REGION).term(app);
        let mut detail = self
            .cache
            .with_cache(&key, self.short_ttl, || async move {
                let record = self.lookup(app, LOOKUP_REGION).await?;
                Ok::<_, StoreBotError>(AppDetail {
                    query: app.to_string(),
                    app_id: app_id(&record),
                    rating: record.average_user_rating,
                    size: record.file_size_bytes.map(format_bytes),
                    updated: record
                        .current_version_release_date
                        .as_deref()
                        .or(record.release_date.as_deref())
                        .and_then(parse_store_date)
                        .map(|d| local_ymd(d, self.zone)),
                    version: record.version,
                    minimum_os: record.minimum_os_version,
                    name: record.track_name,
                    store_url: Some(record.track_view_url),
                })
            })
            .await?;
        detail.store_url = self.link_for(&detail.app_id, detail.store_url.take());
        Ok(detail)
    }

    pub async fn icon(&self, app: &str) -> Result<AppIcon, StoreBotError> {
        let key = self.key(CacheCategory::Icon).part(LOOKUP_REGION).term(app);
        let mut icon = self
            .cache
            .with_cache(&key, self.short_ttl, || async move {
                let record = self.lookup(app, LOOKUP_REGION).await?;
                let (artwork_url, high_res) = self.best_artwork(&record).await?;
                Ok::<_, StoreBotError>(AppIcon {
                    query: app.to_string(),
                    app_id: app_id(&record),
                    name: record.track_name,
                    store_url: Some(record.track_view_url),
                    artwork_url,
                    high_res,
                })
            })
            .await?;
        icon.store_url = self.link_for(&icon.app_id, icon.store_url.take());
        Ok(icon)
    }

    /// Latest release of every platform that has any.
    pub async fn os_summary(&self) -> Result<OsSummary, StoreBotError> {
        let key = self.key(CacheCategory::Os).part("summary");
        self.cache
            .with_cache(&key, self.long_ttl, || async move {
                let manifest = self.manifest.fetch().await?;
                let lines: Vec<OsSummaryLine> = Platform::ALL
                    .into_iter()
                    .filter_map(|platform| {
                        let mut releases = collect_releases(&manifest, platform);
                        sort_latest_first(&mut releases);
                        releases.first().map(|latest| OsSummaryLine {
                            platform,
                            latest: self.release_line(latest),
                        })
                    })
                    .collect();
                if lines.is_empty() {
                    return Err(StoreBotError::UpstreamEmptyResult { source_name: "manifest" });
                }
                Ok::<_, StoreBotError>(OsSummary { lines })
            })
            .await
    }

    /// Latest release of `platform` plus its recent history.
    pub async fn os_detail(&self, platform: Platform) -> Result<OsDetail, StoreBotError> {
        let key = self.key(CacheCategory::Os).part("detail").part(platform.as_str());
        self.cache
            .with_cache(&key, self.long_ttl, || async move {
                let manifest = self.manifest.fetch().await?;
                let mut releases = collect_releases(&manifest, platform);
                sort_latest_first(&mut releases);
                let recent: Vec<ReleaseLine> = releases
                    .iter()
                    .take(RECENT_RELEASES)
                    .map(|r| self.release_line(r))
                    .collect();
                let latest = recent
                    .first()
                    .cloned()
                    .ok_or(StoreBotError::UpstreamEmptyResult { source_name: "manifest" })?;
                Ok::<_, StoreBotError>(OsDetail {
                    platform,
                    latest,
                    recent,
                })
            })
            .await
    }

    /// Store size and limits, for administrators only.
    pub async fn admin_status(&self, user_id: &str) -> Result<AdminStatus, StoreBotError> {
        if !self.quota.is_admin(user_id) {
            return Err(StoreBotError::Unauthorized(user_id.to_string()));
        }
        let key_count = match self.store.key_count().await {
            Ok(n) => Some(n),
            Err(e) => {
                warn!(error = %e, "store size unavailable");
                None
            }
        };
        Ok(AdminStatus {
            key_count,
            daily_limit: self.limits.daily_limit,
            checked_at: Utc::now()
                .with_timezone(&self.zone)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
        })
    }

    pub async fn set_vip(&self, admin_id: &str, user_id: &str, enabled: bool) -> Result<(), StoreBotError> {
        self.quota.set_vip(admin_id, user_id, enabled).await
    }

    fn key(&self, category: CacheCategory) -> CacheKey {
        CacheKey::new(&self.schema, category)
    }

    async fn lookup(&self, app: &str, region: &str) -> Result<AppRecord, StoreBotError> {
        self.search
            .find(app, region)
            .await?
            .ok_or(StoreBotError::UpstreamEmptyResult { source_name: "search" })
    }

    async fn estimate(&self, record: &AppRecord) -> Option<String> {
        let price = record.price.filter(|p| *p > 0.0)?;
        let currency = record.currency.as_deref()?;
        let rate = self.rates.rate(currency, &self.home_currency).await?;
        Some(format!("{} {:.2}", self.home_currency, price * rate))
    }

    async fn best_artwork(&self, record: &AppRecord) -> Result<(String, bool), StoreBotError> {
        if let Some(high) = record.artwork_url100.as_deref().and_then(high_res_artwork) {
            if self.fetcher.probe(&high, self.probe_timeout).await {
                return Ok((high, true));
            }
            debug!(url = %high, "high-resolution artwork not reachable");
        }
        record
            .artwork_url512
            .clone()
            .or_else(|| record.artwork_url100.clone())
            .map(|url| (url, false))
            .ok_or(StoreBotError::UpstreamEmptyResult { source_name: "artwork" })
    }

    fn release_line(&self, release: &Release) -> ReleaseLine {
        ReleaseLine {
            version: release.version.clone(),
            build: release.build.clone(),
            stability: release.stability,
            date: release.release_date.map(|d| local_ymd(d, self.zone)),
        }
    }

    fn link_for(&self, app_id: &str, url: Option<String>) -> Option<String> {
        if self.blocked.contains(app_id) {
            return None;
        }
        url.filter(|u| !u.is_empty())
    }
}

fn app_id(record: &AppRecord) -> String {
    record.track_id.map(|id| id.to_string()).unwrap_or_default()
}
