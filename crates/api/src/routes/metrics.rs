use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Router};
use chrono::Utc;

use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::state::AppState;

/// Content type of the Prometheus text exposition format.
const TEXT_FORMAT: &str = "text/plain; version=0.0.4";

/// GET /metrics -- render the active registry as gauge samples.
///
/// Reads the engine on every scrape, independent of the reconciliation
/// cadence.
async fn scrape(State(state): State<AppState>) -> AppResult<Response> {
    let entries = state
        .engine
        .active_entries(Utc::now(), state.config.retention_window());

    let body = metrics::render(&entries)
        .map_err(|e| AppError::Internal(format!("metrics encoding failed: {e}")))?;

    Ok(([(CONTENT_TYPE, TEXT_FORMAT)], body).into_response())
}

/// Mount the exposition route (served on the metrics listener).
pub fn router() -> Router<AppState> {
    Router::new().route("/metrics", get(scrape))
}
