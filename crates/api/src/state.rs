use std::sync::Arc;

use storereg_core::freshness::FreshnessSource;
use storereg_core::registry::RegistryEngine;
use storereg_state::RegistryStore;

use crate::config::ExporterConfig;

/// Shared application state available to all Axum handlers via
/// `State<AppState>` and to the reconciliation task.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// The expected-presence registry.
    pub engine: Arc<RegistryEngine>,
    /// Durable registry persistence.
    pub store: Arc<RegistryStore>,
    /// Discovery source (the Prometheus client in production, a stub in
    /// tests).
    pub freshness: Arc<dyn FreshnessSource>,
    /// Exporter configuration.
    pub config: Arc<ExporterConfig>,
}
