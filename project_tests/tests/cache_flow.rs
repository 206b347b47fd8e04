use lib_storebot::connections::KeyValueStore;
use lib_storebot::services::{ActionReply, ActionRequest};
use pretty_assertions::assert_eq;
use project_tests::{bot_with_store, search_hit, settings_for};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn equivalent_queries_share_one_upstream_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("country", "jp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_hit(904280696, "Things 3")))
        .expect(1)
        .mount(&server)
        .await;

    let (bot, store) = bot_with_store(&settings_for(&server));
    let first = bot
        .handle("u1", ActionRequest::Price { app: "Things 3".into(), region: "JP".into() })
        .await
        .unwrap();
    let second = bot
        .handle("u2", ActionRequest::Price { app: "things3".into(), region: "jp".into() })
        .await
        .unwrap();

    let (ActionReply::Price(a), ActionReply::Price(b)) = (first, second) else {
        panic!("expected price replies");
    };
    assert_eq!(a.name, b.name);
    assert_eq!(a.label, "Free");
    assert!(store.get("v7:price:jp:things3").await.unwrap().is_some());
}

#[tokio::test]
async fn failures_are_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_hit(7, "Pixel")))
        .expect(1)
        .mount(&server)
        .await;

    let (bot, _store) = bot_with_store(&settings_for(&server));
    let err = bot.detail("pixel").await.unwrap_err();
    assert!(err.is_temporarily_unavailable());

    let detail = bot.detail("pixel").await.unwrap();
    assert_eq!(detail.size.as_deref(), Some("50.0 MB"));
    assert_eq!(detail.updated.as_deref(), Some("2024-05-20"));
}

#[tokio::test]
async fn schema_version_partitions_the_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_hit(7, "Pixel")))
        .expect(2)
        .mount(&server)
        .await;

    let mut settings = settings_for(&server);
    let (old_bot, store) = bot_with_store(&settings);
    old_bot.detail("pixel").await.unwrap();

    settings.cache.schema_version = "v8".to_string();
    let new_bot = lib_storebot::services::StoreBot::from_settings(&settings, store.clone()).unwrap();
    new_bot.detail("pixel").await.unwrap();

    assert!(store.get("v7:detail:us:pixel").await.unwrap().is_some());
    assert!(store.get("v8:detail:us:pixel").await.unwrap().is_some());
}
