//! # Chart Retriever
//!
//! Fetches a top-apps ranking. The legacy RSS feed carries richer data but
//! times out often, so it gets a short bound and any failure (timeout, HTTP
//! error, undecodable or empty body) falls through to the modern feed. Both
//! shapes are normalized into [`ChartEntry`] and rank order is kept exactly
//! as the winning source returned it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::StoreBotError;
use crate::retrieve::{FetchOptions, UpstreamFetcher};

/// Which ranking to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Free,
    Paid,
}

impl ChartKind {
    /// Tag used in cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Free => "free",
            ChartKind::Paid => "paid",
        }
    }

    fn legacy_feed(&self) -> &'static str {
        match self {
            ChartKind::Free => "topfreeapplications",
            ChartKind::Paid => "toppaidapplications",
        }
    }

    fn modern_feed(&self) -> &'static str {
        match self {
            ChartKind::Free => "top-free",
            ChartKind::Paid => "top-paid",
        }
    }
}

/// One ranked app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartEntry {
    /// Store id, empty when the feed omitted it.
    pub id: String,
    /// App name, "Unknown app" when the feed omitted it.
    pub name: String,
    /// Empty when the feed carried no link.
    pub store_url: String,
}

/// Which feed produced a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartSource {
    Legacy,
    Modern,
}

/// A normalized ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    pub region: String,
    pub kind: ChartKind,
    pub source: ChartSource,
    pub entries: Vec<ChartEntry>,
}

/// Base URLs of the two feeds.
#[derive(Debug, Clone)]
pub struct ChartEndpoints {
    pub legacy_base: String,
    pub modern_base: String,
}

impl Default for ChartEndpoints {
    fn default() -> Self {
        Self {
            legacy_base: "https://itunes.apple.com".to_string(),
            modern_base: "https://rss.marketingtools.apple.com".to_string(),
        }
    }
}

/// Bounds for each tier and the chart length.
#[derive(Debug, Clone, Copy)]
pub struct ChartOptions {
    pub primary: FetchOptions,
    pub fallback: FetchOptions,
    pub limit: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            primary: FetchOptions::new(2500, 0),
            fallback: FetchOptions::new(3000, 0),
            limit: 10,
        }
    }
}

/// Two-tier chart client.
#[derive(Debug, Clone)]
pub struct ChartRetriever {
    fetcher: UpstreamFetcher,
    endpoints: ChartEndpoints,
    options: ChartOptions,
}

impl ChartRetriever {
    /// Builds a retriever; the legacy feed uses `options.primary`, the modern
    /// feed `options.fallback`.
    pub fn new(fetcher: UpstreamFetcher, endpoints: ChartEndpoints, options: ChartOptions) -> Self {
        Self {
            fetcher,
            endpoints,
            options,
        }
    }

    /// Fetches the `kind` chart for the (already normalized) `region`.
    ///
    /// # Errors
    /// `UpstreamEmptyResult` when both feeds fail or come back empty.
    pub async fn get_chart(&self, region: &str, kind: ChartKind) -> Result<Chart, StoreBotError> {
        match self.fetch_legacy(region, kind).await {
            Ok(entries) if !entries.is_empty() => {
                return Ok(Chart {
                    region: region.to_string(),
                    kind,
                    source: ChartSource::Legacy,
                    entries,
                });
            }
            Ok(_) => info!(region, kind = kind.as_str(), "legacy chart feed empty, switching to modern feed"),
            Err(e) => info!(region, kind = kind.as_str(), error = %e, "legacy chart feed failed, switching to modern feed"),
        }

        match self.fetch_modern(region, kind).await {
            Ok(entries) if !entries.is_empty() => Ok(Chart {
                region: region.to_string(),
                kind,
                source: ChartSource::Modern,
                entries,
            }),
            Ok(_) => {
                warn!(region, kind = kind.as_str(), "both chart feeds returned no entries");
                Err(StoreBotError::UpstreamEmptyResult { source_name: "chart" })
            }
            Err(e) => {
                warn!(region, kind = kind.as_str(), error = %e, "both chart feeds failed");
                Err(StoreBotError::UpstreamEmptyResult { source_name: "chart" })
            }
        }
    }

    async fn fetch_legacy(&self, region: &str, kind: ChartKind) -> Result<Vec<ChartEntry>, StoreBotError> {
        let url = format!(
            "{}/{}/rss/{}/limit={}/json",
            self.endpoints.legacy_base.trim_end_matches('/'),
            region,
            kind.legacy_feed(),
            self.options.limit
        );
        let doc: Value = self.fetcher.fetch_json(&url, self.options.primary).await?;
        Ok(parse_legacy_feed(&doc))
    }

    async fn fetch_modern(&self, region: &str, kind: ChartKind) -> Result<Vec<ChartEntry>, StoreBotError> {
        let url = format!(
            "{}/api/v2/{}/apps/{}/{}/apps.json",
            self.endpoints.modern_base.trim_end_matches('/'),
            region,
            kind.modern_feed(),
            self.options.limit
        );
        let doc: Value = self.fetcher.fetch_json(&url, self.options.fallback).await?;
        Ok(parse_modern_feed(&doc))
    }
}

fn text_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str)
}

/// Normalizes `feed.entry` of the legacy RSS feed. A single-entry feed is an
/// object instead of an array; `link` likewise may be an object or an array.
pub fn parse_legacy_feed(doc: &Value) -> Vec<ChartEntry> {
    let entries: Vec<&Value> = match doc.pointer("/feed/entry") {
        Some(Value::Array(list)) => list.iter().collect(),
        Some(obj @ Value::Object(_)) => vec![obj],
        _ => Vec::new(),
    };

    entries
        .into_iter()
        .map(|entry| {
            let store_url = match entry.get("link") {
                Some(Value::Array(links)) => links.first().and_then(|l| text_at(l, "/attributes/href")),
                Some(link @ Value::Object(_)) => text_at(link, "/attributes/href"),
                _ => None,
            };
            ChartEntry {
                id: text_at(entry, "/id/attributes/im:id").unwrap_or_default().to_string(),
                name: text_at(entry, "/im:name/label").unwrap_or("Unknown app").to_string(),
                store_url: store_url.unwrap_or_default().to_string(),
            }
        })
        .collect()
}

/// Normalizes `feed.results` of the modern marketing-tools feed.
pub fn parse_modern_feed(doc: &Value) -> Vec<ChartEntry> {
    doc.pointer("/feed/results")
        .and_then(Value::as_array)
        .map(|results| {
            results
                .iter()
                .map(|r| ChartEntry {
                    id: match r.get("id") {
                        Some(Value::String(s)) => s.clone(),
                        Some(Value::Number(n)) => n.to_string(),
                        _ => String::new(),
                    },
                    name: text_at(r, "/name").unwrap_or("Unknown app").to_string(),
                    store_url: text_at(r, "/url").unwrap_or_default().to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieve::FetcherConfig;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn modern_body(n: usize) -> Value {
        let results: Vec<Value> = (0..n)
            .map(|i| json!({"id": format!("{}", 1000 + i), "name": format!("App {i}"), "url": format!("https://apps.apple.com/app/id{}", 1000 + i)}))
            .collect();
        json!({"feed": {"results": results}})
    }

    fn retriever(server: &MockServer) -> ChartRetriever {
        let fetcher = UpstreamFetcher::new(FetcherConfig::default()).expect("client builds");
        let endpoints = ChartEndpoints {
            legacy_base: server.uri(),
            modern_base: server.uri(),
        };
        let options = ChartOptions {
            primary: FetchOptions::new(200, 0),
            fallback: FetchOptions::new(1000, 0),
            limit: 10,
        };
        ChartRetriever::new(fetcher, endpoints, options)
    }

    #[test]
    fn legacy_feed_shapes() {
        let doc = json!({"feed": {"entry": [
            {"id": {"attributes": {"im:id": "1"}}, "im:name": {"label": "One"}, "link": [{"attributes": {"href": "https://a/1"}}]},
            {"id": {"attributes": {"im:id": "2"}}, "im:name": {"label": "Two"}, "link": {"attributes": {"href": "https://a/2"}}},
            {"im:name": {"label": "Three"}}
        ]}});
        let entries = parse_legacy_feed(&doc);
        assert_eq!(
            entries,
            vec![
                ChartEntry { id: "1".into(), name: "One".into(), store_url: "https://a/1".into() },
                ChartEntry { id: "2".into(), name: "Two".into(), store_url: "https://a/2".into() },
                ChartEntry { id: String::new(), name: "Three".into(), store_url: String::new() },
            ]
        );

        let single = json!({"feed": {"entry": {"id": {"attributes": {"im:id": "9"}}, "im:name": {"label": "Solo"}}}});
        assert_eq!(parse_legacy_feed(&single).len(), 1);
        assert!(parse_legacy_feed(&json!({"feed": {}})).is_empty());
    }

    #[tokio::test]
    async fn legacy_feed_wins_when_available() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/us/rss/topfreeapplications/limit=10/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"feed": {"entry": [
                {"id": {"attributes": {"im:id": "42"}}, "im:name": {"label": "Legacy"}}
            ]}})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/us/apps/top-free/10/apps.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(modern_body(3)))
            .expect(0)
            .mount(&server)
            .await;

        let chart = retriever(&server).get_chart("us", ChartKind::Free).await.unwrap();
        assert_eq!(chart.source, ChartSource::Legacy);
        assert_eq!(chart.entries[0].id, "42");
    }

    #[tokio::test]
    async fn timeout_on_legacy_falls_back_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jp/rss/toppaidapplications/limit=10/json"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(800)))
            .mount(&server)
            .await;
        let body = modern_body(10);
        Mock::given(method("GET"))
            .and(path("/api/v2/jp/apps/top-paid/10/apps.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
            .mount(&server)
            .await;

        let chart = retriever(&server).get_chart("jp", ChartKind::Paid).await.unwrap();
        assert_eq!(chart.source, ChartSource::Modern);
        assert_eq!(chart.entries, parse_modern_feed(&body));
        let ids: Vec<_> = chart.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, (1000..1010).map(|i| i.to_string()).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn empty_legacy_feed_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gb/rss/topfreeapplications/limit=10/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"feed": {"entry": []}})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/gb/apps/top-free/10/apps.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(modern_body(2)))
            .mount(&server)
            .await;

        let chart = retriever(&server).get_chart("gb", ChartKind::Free).await.unwrap();
        assert_eq!(chart.source, ChartSource::Modern);
        assert_eq!(chart.entries.len(), 2);
    }

    #[tokio::test]
    async fn both_feeds_failing_is_no_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = retriever(&server).get_chart("de", ChartKind::Free).await.unwrap_err();
        assert!(matches!(err, StoreBotError::UpstreamEmptyResult { source_name: "chart" }));
    }
}
