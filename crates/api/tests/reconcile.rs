//! Integration tests driving real reconciliation cycles against the
//! engine, the stub discovery source and the on-disk registry file.

mod common;

use chrono::{Duration, Utc};
use common::StubFreshness;
use storereg_api::background::reconcile;
use tempfile::TempDir;

fn ids(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Test: a successful cycle adds stores, records the sync and persists
// ---------------------------------------------------------------------------

#[tokio::test]
async fn successful_cycle_applies_discovery_and_persists() {
    let dir = TempDir::new().unwrap();
    let state = common::test_state(&dir, vec![StubFreshness::online(&["0101", "0102"])]);

    reconcile::run_cycle(&state).await;

    let snapshot = state.engine.snapshot();
    assert!(snapshot.contains_key("0101"));
    assert!(snapshot.contains_key("0102"));

    let status = state.engine.sync_status();
    assert!(status.last_sync.is_some());
    assert!(status.last_error.is_none());

    // The post-cycle state reached the registry file.
    let persisted = state.store.load().await;
    assert!(persisted.contains_key("0101"));
    assert!(persisted.contains_key("0102"));
}

// ---------------------------------------------------------------------------
// Test: repeated cycles accumulate stores (incremental touch, no removal)
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stores_absent_from_a_later_cycle_survive() {
    let dir = TempDir::new().unwrap();
    let state = common::test_state(
        &dir,
        vec![
            StubFreshness::online(&["A", "B"]),
            StubFreshness::online(&["B", "C"]),
        ],
    );

    reconcile::run_cycle(&state).await;
    reconcile::run_cycle(&state).await;

    let snapshot = state.engine.snapshot();
    assert_eq!(snapshot.len(), 3);
    assert!(snapshot.contains_key("A"));
    assert!(snapshot.contains_key("B"));
    assert!(snapshot.contains_key("C"));
    // B was touched by the second cycle.
    assert!(snapshot["B"] > snapshot["A"]);
}

// ---------------------------------------------------------------------------
// Test: a failed query still runs expiry and persists the swept state
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_cycle_still_expires_and_persists() {
    let dir = TempDir::new().unwrap();
    let state = common::test_state(&dir, vec![StubFreshness::failing("boom")]);

    let now = Utc::now();
    state.engine.apply_discovery(ids(&["fresh"]), now);
    state.engine.apply_discovery(ids(&["stale"]), now - Duration::days(31));

    reconcile::run_cycle(&state).await;

    // The registry was not fed new discoveries, but the sweep ran.
    let snapshot = state.engine.snapshot();
    assert!(snapshot.contains_key("fresh"));
    assert!(!snapshot.contains_key("stale"));

    // The error landed in the sync status.
    let status = state.engine.sync_status();
    assert!(status.last_sync.is_some());
    assert!(status.last_error.as_deref().unwrap().contains("boom"));

    // The post-expiry state was persisted despite the failure.
    let persisted = state.store.load().await;
    assert!(persisted.contains_key("fresh"));
    assert!(!persisted.contains_key("stale"));
}

// ---------------------------------------------------------------------------
// Test: a later successful cycle clears the recorded error
// ---------------------------------------------------------------------------

#[tokio::test]
async fn recovery_cycle_clears_sync_error() {
    let dir = TempDir::new().unwrap();
    let state = common::test_state(
        &dir,
        vec![
            StubFreshness::failing("connection refused"),
            StubFreshness::online(&["0101"]),
        ],
    );

    reconcile::run_cycle(&state).await;
    assert!(state.engine.sync_status().last_error.is_some());

    reconcile::run_cycle(&state).await;
    let status = state.engine.sync_status();
    assert!(status.last_error.is_none());
    assert!(state.engine.snapshot().contains_key("0101"));
}
