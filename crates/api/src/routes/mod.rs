//! Route definitions for both HTTP surfaces.
//!
//! The exporter serves two listeners: the metrics port carries only the
//! Prometheus exposition, the web port carries the health check and the
//! read-only introspection API.

pub mod health;
pub mod metrics;
pub mod registry;
pub mod status;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree for the web listener.
///
/// ```text
/// GET /registry   active entries, most recently seen first
/// GET /status     config, last sync outcome, backend reachability
/// GET /up         live freshness-filtered online set
/// GET /version    version string
/// ```
///
/// All routes are read-only; the reconciliation task is the only writer.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(registry::router())
        .merge(status::router())
}
