//! Worker HTTP behaviour: document shape, caching, fallback

use crate::support::{StubTransport, COPPER_HTML, SHANGHAI_HTML};
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use metal_premium::config::WorkerConfig;
use metal_premium::worker::{router, WorkerState};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const SHANGHAI_URL: &str = "https://shanghai.test/silver";
const COPPER_URL: &str = "https://copper.test/HG.1";

fn worker(transport: Arc<StubTransport>) -> Router {
    let config = WorkerConfig {
        shanghai_url: SHANGHAI_URL.to_string(),
        copper_url: COPPER_URL.to_string(),
        ..WorkerConfig::default()
    };
    router(Arc::new(WorkerState::new(config, transport)))
}

async fn get_json(app: &Router) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CACHE_CONTROL], "max-age=60");
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn live_transport() -> Arc<StubTransport> {
    Arc::new(
        StubTransport::new()
            .with(SHANGHAI_URL, SHANGHAI_HTML)
            .with(COPPER_URL, COPPER_HTML),
    )
}

#[tokio::test(start_paused = true)]
async fn test_cached_until_ttl_expires() {
    let transport = live_transport();
    let app = worker(transport.clone());

    let first = get_json(&app).await;
    assert_eq!(first["cached"], false);
    assert_eq!(transport.requests(), 2);

    tokio::time::advance(Duration::from_secs(299)).await;
    let mut second = get_json(&app).await;
    assert_eq!(second["cached"], true);
    assert_eq!(transport.requests(), 2);

    // identical apart from the cache marker
    second["cached"] = serde_json::Value::Bool(false);
    assert_eq!(first, second);

    tokio::time::advance(Duration::from_secs(2)).await;
    let third = get_json(&app).await;
    assert_eq!(third["cached"], false);
    assert_eq!(transport.requests(), 4);
}

#[tokio::test]
async fn test_live_document() {
    let doc = get_json(&worker(live_transport())).await;

    assert_eq!(doc["shanghai"]["usdPerOz"], 88.64);
    assert_eq!(doc["western"]["usdPerOz"], 83.62);
    assert!((doc["premium"]["usd"].as_f64().unwrap() - 5.02).abs() < 1e-9);
    assert!((doc["premium"]["percent"].as_f64().unwrap() - 6.0034).abs() < 1e-3);
    assert_eq!(doc["copper"]["perLb"], 4.5225);
    assert!((doc["shanghai"]["cnyPerKg"].as_f64().unwrap() - 20633.0).abs() < 1.0);
    assert_eq!(doc["source"], "goldsilver.ai + cnbc");
    assert!(doc.get("error").is_none());
}

#[tokio::test]
async fn test_copper_failure_only_defaults_copper() {
    let transport = Arc::new(StubTransport::new().with(SHANGHAI_URL, SHANGHAI_HTML));
    let doc = get_json(&worker(transport)).await;

    assert_eq!(doc["shanghai"]["usdPerOz"], 88.64);
    assert_eq!(doc["copper"]["perLb"], 4.5);
    assert_eq!(doc["copper"]["live"], false);
}

#[tokio::test]
async fn test_unreachable_upstream_serves_fallback_uncached() {
    let transport = Arc::new(StubTransport::new());
    let app = worker(transport.clone());

    let doc = get_json(&app).await;
    assert_eq!(doc["source"], "fallback");
    assert_eq!(doc["shanghai"]["usdPerOz"], 88.0);
    assert_eq!(doc["premium"]["percent"], 6.0);
    assert!(doc["error"].as_str().unwrap().contains("connection refused"));

    // upstream recovers: the next request fetches again instead of replaying the fallback
    transport.set(SHANGHAI_URL, SHANGHAI_HTML);
    let doc = get_json(&app).await;
    assert_eq!(doc["source"], "goldsilver.ai + cnbc");
    assert_eq!(doc["cached"], false);
}

#[tokio::test]
async fn test_cors_headers() {
    let response = worker(live_transport())
        .oneshot(
            Request::builder()
                .uri("/prices")
                .header(header::ORIGIN, "https://dashboard.test")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
}
