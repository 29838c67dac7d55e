use axum::extract::State;
use axum::{routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::error::AppResult;
use crate::state::AppState;

/// GET /api/status response: static configuration plus the last sync
/// outcome and a live backend reachability probe.
#[derive(Serialize)]
pub struct StatusResponse {
    pub version: &'static str,
    pub prometheus_url: String,
    pub registry_file: String,
    pub retention_days: i64,
    pub staleness_sec: u64,
    pub sync_interval_secs: u64,
    /// RFC 3339 time of the last reconciliation attempt, `null` before
    /// the first cycle.
    pub last_sync: Option<String>,
    pub last_sync_error: Option<String>,
    pub prometheus_reachable: bool,
    /// Stores online right now per a live backend query, `0` when the
    /// backend is unreachable.
    pub stores_up_now: usize,
    pub stores_in_registry: usize,
}

#[derive(Serialize)]
pub struct UpResponse {
    pub stores: Vec<String>,
}

#[derive(Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
}

/// GET /api/status -- configuration, sync outcome, backend reachability.
async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let live = state.freshness.online_now().await;
    let sync = state.engine.sync_status();
    let stores_in_registry = state
        .engine
        .active_count(Utc::now(), state.config.retention_window());

    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        prometheus_url: state.config.prometheus_url.clone(),
        registry_file: state.config.registry_file.display().to_string(),
        retention_days: state.config.retention_days,
        staleness_sec: state.config.staleness_secs,
        sync_interval_secs: state.config.sync_interval_secs,
        last_sync: sync.last_sync.map(|at| at.to_rfc3339()),
        last_sync_error: sync.last_error,
        prometheus_reachable: live.is_ok(),
        stores_up_now: live.map(|stores| stores.len()).unwrap_or(0),
        stores_in_registry,
    })
}

/// GET /api/up -- the live freshness-filtered online set.
///
/// Unlike `/api/registry` this bypasses the registry entirely and asks
/// the backend directly; a backend failure surfaces as 502.
async fn up(State(state): State<AppState>) -> AppResult<Json<UpResponse>> {
    let stores = state.freshness.online_now().await?;
    Ok(Json(UpResponse {
        stores: stores.into_iter().collect(),
    }))
}

/// GET /api/version.
async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(status))
        .route("/up", get(up))
        .route("/version", get(version))
}
