//! Periodic reconciliation of the store registry.
//!
//! One cycle: query the backend for the online set, fold the result into
//! the registry, sweep entries past retention, persist. Cycles run
//! sequentially on a fixed interval -- the next tick is not processed
//! until the previous cycle finishes, so cycles never overlap.

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::state::AppState;

/// Run the reconciliation loop until `cancel` is triggered.
pub async fn run(state: AppState, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = state.config.sync_interval_secs,
        retention_days = state.config.retention_days,
        "Registry reconciliation task started"
    );

    let mut interval = tokio::time::interval(state.config.sync_interval());

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Registry reconciliation task stopping");
                break;
            }
            _ = interval.tick() => {
                run_cycle(&state).await;
            }
        }
    }
}

/// Execute a single reconciliation cycle.
///
/// Every step handles its own failure: a backend error skips discovery
/// for the cycle but never the sweep or the save, and a failed save
/// leaves the in-memory registry authoritative until the next attempt.
pub async fn run_cycle(state: &AppState) {
    match state.freshness.online_now().await {
        Ok(stores) => {
            state.engine.record_sync(Utc::now(), None);

            let added = state.engine.apply_discovery(stores, Utc::now());
            if !added.is_empty() {
                tracing::info!(count = added.len(), stores = ?added, "Discovered new stores");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Backend discovery failed, registry unchanged this cycle");
            state.engine.record_sync(Utc::now(), Some(e.to_string()));
        }
    }

    let removed = state
        .engine
        .expire(Utc::now(), state.config.retention_window());
    if !removed.is_empty() {
        tracing::info!(
            count = removed.len(),
            retention_days = state.config.retention_days,
            stores = ?removed,
            "Expired stores past retention"
        );
    }

    if let Err(e) = state.store.save(&state.engine.snapshot()).await {
        tracing::error!(error = %e, "Failed to persist registry, will retry next cycle");
    }
}
