use axum::extract::State;
use axum::{routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

/// One active registry entry as exposed over the API.
///
/// `last_seen` is epoch seconds (matching the on-disk format),
/// `last_seen_iso` the same instant in RFC 3339 for humans.
#[derive(Serialize)]
pub struct RegistryEntryDto {
    pub store: String,
    pub last_seen: i64,
    pub last_seen_iso: String,
}

#[derive(Serialize)]
pub struct RegistryResponse {
    pub stores: Vec<RegistryEntryDto>,
    pub count: usize,
}

/// GET /api/registry -- active entries, most recently seen first.
async fn list_registry(State(state): State<AppState>) -> Json<RegistryResponse> {
    let stores: Vec<RegistryEntryDto> = state
        .engine
        .active_entries(Utc::now(), state.config.retention_window())
        .into_iter()
        .map(|entry| RegistryEntryDto {
            store: entry.store,
            last_seen: entry.last_seen.timestamp(),
            last_seen_iso: entry.last_seen.to_rfc3339(),
        })
        .collect();

    let count = stores.len();
    Json(RegistryResponse { stores, count })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/registry", get(list_registry))
}
