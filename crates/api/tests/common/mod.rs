//! Shared helpers for integration tests.
//!
//! Builds the same routers the binary serves, backed by a scripted
//! discovery stub and a temp-dir registry file, so tests exercise the
//! real middleware stack and the real reconciliation cycle.

use std::collections::{BTreeSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderName, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use storereg_api::config::ExporterConfig;
use storereg_api::routes;
use storereg_api::state::AppState;
use storereg_core::error::CoreError;
use storereg_core::freshness::FreshnessSource;
use storereg_core::registry::RegistryEngine;
use storereg_core::types::StoreId;
use storereg_state::RegistryStore;

/// Scripted discovery source: answers from a queue, then keeps
/// returning an empty online set once the queue is drained.
pub struct StubFreshness {
    responses: Mutex<VecDeque<Result<BTreeSet<StoreId>, CoreError>>>,
}

impl StubFreshness {
    pub fn new(responses: Vec<Result<BTreeSet<StoreId>, CoreError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }

    /// A successful discovery answer.
    pub fn online(stores: &[&str]) -> Result<BTreeSet<StoreId>, CoreError> {
        Ok(stores.iter().map(|s| s.to_string()).collect())
    }

    /// A failed discovery answer.
    pub fn failing(message: &str) -> Result<BTreeSet<StoreId>, CoreError> {
        Err(CoreError::Backend(message.to_string()))
    }
}

#[async_trait]
impl FreshnessSource for StubFreshness {
    async fn online_now(&self) -> Result<BTreeSet<StoreId>, CoreError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(BTreeSet::new()))
    }
}

/// Build a test `ExporterConfig` with the registry file inside `dir`.
pub fn test_config(dir: &TempDir) -> ExporterConfig {
    ExporterConfig {
        host: "127.0.0.1".to_string(),
        metrics_port: 0,
        web_port: 0,
        registry_file: dir.path().join("registry.json"),
        prometheus_url: "http://localhost:9090".to_string(),
        job_selector: "retail_windows|retail_mikrotik".to_string(),
        staleness_secs: 120,
        sync_interval_secs: 300,
        retention_days: 30,
        request_timeout_secs: 30,
    }
}

/// Build an `AppState` with an empty engine and the given scripted
/// discovery answers.
pub fn test_state(
    dir: &TempDir,
    responses: Vec<Result<BTreeSet<StoreId>, CoreError>>,
) -> AppState {
    let config = test_config(dir);
    AppState {
        engine: Arc::new(RegistryEngine::new(Default::default())),
        store: Arc::new(RegistryStore::new(config.registry_file.clone())),
        freshness: Arc::new(StubFreshness::new(responses)),
        config: Arc::new(config),
    }
}

/// Build the web router with the full middleware stack.
///
/// This mirrors the router construction in `main.rs` so integration
/// tests exercise the same middleware (request ID, timeout, tracing,
/// panic recovery) that production uses.
pub fn build_web_app(state: AppState) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .nest("/api", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .with_state(state)
}

/// Build the metrics router as served on the metrics listener.
pub fn build_metrics_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::metrics::router())
        .with_state(state)
}

/// Issue a GET request against the app.
pub async fn get(app: Router, uri: &str) -> axum::http::Response<axum::body::Body> {
    app.oneshot(
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Collect a response body as JSON.
pub async fn body_json(response: axum::http::Response<axum::body::Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Collect a response body as text.
pub async fn body_text(response: axum::http::Response<axum::body::Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
