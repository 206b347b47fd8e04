use std::sync::Arc;

use lib_storebot::StoreBotError;
use lib_storebot::connections::MemoryStore;
use lib_storebot::services::{ActionReply, ActionRequest, StoreBot};
use project_tests::{bot_with_store, search_hit, settings_for};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn detail(app: &str) -> ActionRequest {
    ActionRequest::Detail { app: app.to_string() }
}

#[tokio::test]
async fn denied_requests_never_reach_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_hit(1, "Alpha")))
        .expect(1)
        .mount(&server)
        .await;

    let mut settings = settings_for(&server);
    settings.quota.action_limits.insert("detail".to_string(), 1);
    let (bot, _store) = bot_with_store(&settings);

    let first = bot.handle("u1", detail("alpha")).await.unwrap();
    assert!(matches!(first, ActionReply::Detail(_)));

    let err = bot.handle("u1", detail("beta")).await.unwrap_err();
    match err {
        StoreBotError::QuotaExceeded { limit, .. } => assert_eq!(limit, 1),
        other => panic!("expected QuotaExceeded, got {other:?}"),
    }
}

#[tokio::test]
async fn global_cap_applies_across_actions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_hit(1, "Alpha")))
        .expect(2)
        .mount(&server)
        .await;

    let mut settings = settings_for(&server);
    settings.quota.daily_limit = 2;
    let (bot, _store) = bot_with_store(&settings);

    bot.handle("u1", detail("alpha")).await.unwrap();
    bot.handle("u1", ActionRequest::Icon { app: "alpha".into() }).await.unwrap();
    let err = bot
        .handle("u1", ActionRequest::Price { app: "alpha".into(), region: "us".into() })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreBotError::QuotaExceeded { limit: 2, .. }));
}

#[tokio::test]
async fn vip_users_are_never_denied() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_hit(1, "Alpha")))
        .mount(&server)
        .await;

    let mut settings = settings_for(&server);
    settings.quota.daily_limit = 1;
    let (bot, _store) = bot_with_store(&settings);

    assert!(matches!(
        bot.set_vip("u1", "u1", true).await,
        Err(StoreBotError::Unauthorized(_))
    ));
    bot.set_vip("admin", "vip", true).await.unwrap();

    for i in 0..5 {
        bot.handle("vip", detail(&format!("app {i}"))).await.unwrap();
    }
}

#[tokio::test]
async fn store_outage_fails_open_without_caching() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_hit(1, "Alpha")))
        .expect(3)
        .mount(&server)
        .await;

    let mut settings = settings_for(&server);
    settings.quota.daily_limit = 1;
    let bot = StoreBot::from_settings(&settings, Arc::new(MemoryStore::unavailable())).unwrap();

    for _ in 0..3 {
        bot.handle("u1", detail("alpha")).await.unwrap();
    }
}
