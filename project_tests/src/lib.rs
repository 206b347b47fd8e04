//! # Project Tests
//!
//! Fixtures shared by the end-to-end tests in `tests/`: a bot wired to a
//! mock upstream server and an in-memory store, plus canned upstream bodies.

use std::sync::Arc;

use lib_storebot::configs::BotSettings;
use lib_storebot::connections::{KeyValueStore, MemoryStore};
use lib_storebot::services::StoreBot;
use serde_json::{json, Value};
use wiremock::MockServer;

/// Settings with every upstream pointed at `server`, no retries and UTC
/// display dates.
pub fn settings_for(server: &MockServer) -> BotSettings {
    let base = server.uri();
    let mut settings = BotSettings::default();
    settings.upstream.legacy_chart_base = base.clone();
    settings.upstream.modern_chart_base = base.clone();
    settings.upstream.search_base = base.clone();
    settings.upstream.exchange_base = base.clone();
    settings.upstream.manifest_url = format!("{base}/v2/pmv");
    settings.upstream.default_retries = 0;
    settings.upstream.chart_primary_timeout_ms = 300;
    settings.upstream.chart_fallback_timeout_ms = 1000;
    settings.display_timezone = "UTC".to_string();
    settings.quota.admin_ids = vec!["admin".to_string()];
    settings
}

/// A bot over a fresh in-memory store; the store is returned for inspection.
pub fn bot_with_store(settings: &BotSettings) -> (StoreBot, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let shared: Arc<dyn KeyValueStore> = store.clone();
    let bot = StoreBot::from_settings(settings, shared).expect("bot builds");
    (bot, store)
}

/// Modern chart body with `n` apps named `App 1..=n`.
pub fn modern_chart(n: usize) -> Value {
    let results: Vec<Value> = (1..=n)
        .map(|i| json!({"id": i.to_string(), "name": format!("App {i}"), "url": format!("https://apps.apple.com/app/id{i}")}))
        .collect();
    json!({"feed": {"results": results}})
}

/// Search body with a single hit.
pub fn search_hit(id: u64, name: &str) -> Value {
    json!({"resultCount": 1, "results": [{
        "trackId": id,
        "trackName": name,
        "trackViewUrl": format!("https://apps.apple.com/app/id{id}"),
        "price": 0.0,
        "formattedPrice": "Free",
        "currency": "USD",
        "averageUserRating": 4.5,
        "fileSizeBytes": "52428800",
        "version": "3.1",
        "minimumOsVersion": "16.0",
        "currentVersionReleaseDate": "2024-05-20T07:00:00Z",
        "artworkUrl512": "https://is1.mzstatic.example/512x512bb.jpg"
    }]})
}
