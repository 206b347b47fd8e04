use std::time::Duration;

use lib_storebot::StoreBotError;
use lib_storebot::appstore::{ChartKind, ChartSource};
use lib_storebot::connections::KeyValueStore;
use lib_storebot::services::{ActionReply, ActionRequest};
use pretty_assertions::assert_eq;
use project_tests::{bot_with_store, modern_chart, settings_for};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LEGACY_FREE_US: &str = "/us/rss/topfreeapplications/limit=10/json";
const MODERN_FREE_US: &str = "/api/v2/us/apps/top-free/10/apps.json";

#[tokio::test]
async fn slow_legacy_feed_falls_back_in_rank_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LEGACY_FREE_US))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"feed": {"entry": []}}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(MODERN_FREE_US))
        .respond_with(ResponseTemplate::new(200).set_body_json(modern_chart(10)))
        .expect(1)
        .mount(&server)
        .await;

    let (bot, _store) = bot_with_store(&settings_for(&server));
    let reply = bot
        .handle("u1", ActionRequest::Chart { region: "US".into(), kind: ChartKind::Free })
        .await
        .unwrap();
    let ActionReply::Chart(report) = reply else {
        panic!("expected a chart");
    };

    assert_eq!(report.source, ChartSource::Modern);
    let names: Vec<&str> = report.lines.iter().map(|l| l.name.as_str()).collect();
    let expected: Vec<String> = (1..=10).map(|i| format!("App {i}")).collect();
    assert_eq!(names, expected.iter().map(String::as_str).collect::<Vec<_>>());
    assert_eq!(report.lines[9].rank, 10);
}

#[tokio::test]
async fn both_feeds_down_is_no_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .expect(2)
        .mount(&server)
        .await;

    let (bot, store) = bot_with_store(&settings_for(&server));
    let err = bot.chart("us", ChartKind::Free).await.unwrap_err();
    assert!(err.is_no_data());
    assert!(matches!(err, StoreBotError::UpstreamEmptyResult { source_name: "chart" }));

    assert_eq!(store.get("v7:chart:us:free").await.unwrap(), None);
}
