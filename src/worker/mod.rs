//! Edge worker
//!
//! Scrapes the Shanghai silver page and the copper quote page, serves the
//! combined figures as one JSON document, and memoizes it for a fixed TTL.
//! Upstream failures never surface as HTTP errors.

mod cache;
mod handler;
mod types;

pub use cache::TtlCache;
pub use handler::assemble;
pub use types::{
    CopperBlock, PremiumBlock, ShanghaiBlock, WesternBlock, WorkerQuote, FALLBACK_SOURCE,
    LIVE_SOURCE,
};

use crate::config::WorkerConfig;
use crate::feed::Transport;
use axum::http::{header, Method};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared worker state
pub struct WorkerState {
    pub config: WorkerConfig,
    pub transport: Arc<dyn Transport>,
    pub cache: TtlCache<WorkerQuote>,
}

impl WorkerState {
    pub fn new(config: WorkerConfig, transport: Arc<dyn Transport>) -> Self {
        let cache = TtlCache::new(Duration::from_secs(config.cache_ttl_secs));
        Self {
            config,
            transport,
            cache,
        }
    }
}

/// Build the worker router
///
/// Every `OPTIONS` request is answered by the CORS layer.
pub fn router(state: Arc<WorkerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(handler::get_prices))
        .route("/prices", get(handler::get_prices))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is interrupted
pub async fn serve(state: Arc<WorkerState>, bind: &str) -> anyhow::Result<()> {
    let ttl_secs = state.cache.ttl().as_secs();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(addr = %listener.local_addr()?, ttl_secs, "Worker listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await?;

    tracing::info!("Worker stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::OfflineTransport;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn offline_router() -> Router {
        router(Arc::new(WorkerState::new(
            WorkerConfig::default(),
            Arc::new(OfflineTransport),
        )))
    }

    #[tokio::test]
    async fn test_offline_serves_fallback_document() {
        let response = offline_router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "max-age=60");

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let doc: WorkerQuote = serde_json::from_slice(&body).unwrap();
        assert_eq!(doc.source, FALLBACK_SOURCE);
        assert!(doc.error.unwrap().contains("offline"));
        assert!(!doc.cached);
    }

    #[tokio::test]
    async fn test_fallback_is_not_cached() {
        let state = Arc::new(WorkerState::new(
            WorkerConfig::default(),
            Arc::new(OfflineTransport),
        ));
        let app = router(state.clone());

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(Request::builder().uri("/prices").body(Body::empty()).unwrap())
                .await
                .unwrap();
            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let doc: WorkerQuote = serde_json::from_slice(&body).unwrap();
            assert!(!doc.cached);
        }
        assert!(state.cache.get("shanghai-silver-copper").await.is_none());
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let response = offline_router()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/")
                    .header(header::ORIGIN, "https://example.com")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.status().is_success());
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }

    #[tokio::test]
    async fn test_bare_options_answered_by_cors_layer() {
        let response = offline_router()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/prices")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
        assert!(response.headers().get(header::CACHE_CONTROL).is_none());
    }
}
