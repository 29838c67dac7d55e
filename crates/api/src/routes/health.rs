use axum::extract::State;
use axum::{routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Number of stores currently active in the registry.
    pub stores_in_registry: usize,
}

/// GET /health -- returns service health and registry size.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let stores_in_registry = state
        .engine
        .active_count(Utc::now(), state.config.retention_window());

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        stores_in_registry,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
