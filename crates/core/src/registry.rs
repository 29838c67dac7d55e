//! Expected-presence registry engine.
//!
//! Owns the in-memory mapping of store id to last-seen timestamp and
//! enforces its lifecycle: stores are created on first discovery, touched
//! on every rediscovery, and physically removed by the periodic retention
//! sweep. Visibility and removal are decoupled -- [`RegistryEngine::active_entries`]
//! filters by the retention cutoff at read time, so an entry past its
//! window stops being reported even before [`RegistryEngine::expire`] has
//! swept it.
//!
//! All mutation happens under one `RwLock` held only for the in-memory
//! map update, never across backend queries or disk writes.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Duration;
use serde::Serialize;

use crate::types::{StoreId, Timestamp};

/// One registry entry: a store and the last time discovery saw it online.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryEntry {
    pub store: StoreId,
    pub last_seen: Timestamp,
}

/// Outcome of the most recent reconciliation attempt, successful or not.
///
/// Written only by the reconciliation task; read by the status API.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncStatus {
    /// When the backend was last queried, `None` before the first cycle.
    pub last_sync: Option<Timestamp>,
    /// Error from the last query, `None` if it succeeded.
    pub last_error: Option<String>,
}

/// Thread-safe registry of expected stores.
///
/// Constructed once at startup from persisted state and shared as an
/// `Arc` between the reconciliation task and the read surfaces.
pub struct RegistryEngine {
    entries: RwLock<HashMap<StoreId, Timestamp>>,
    sync: RwLock<SyncStatus>,
}

impl RegistryEngine {
    /// Create an engine seeded with previously persisted entries.
    pub fn new(initial: HashMap<StoreId, Timestamp>) -> Self {
        Self {
            entries: RwLock::new(initial),
            sync: RwLock::new(SyncStatus::default()),
        }
    }

    /// Apply one round of discovery results.
    ///
    /// Stores not yet in the registry are inserted and returned; stores
    /// already present get `last_seen` bumped to `observed_at`. A
    /// timestamp is never moved backwards, and stores absent from `ids`
    /// are never removed here -- only the retention sweep deletes.
    pub fn apply_discovery<I>(&self, ids: I, observed_at: Timestamp) -> Vec<StoreId>
    where
        I: IntoIterator<Item = StoreId>,
    {
        let mut entries = self.entries.write().expect("registry lock poisoned");
        let mut added = Vec::new();

        for id in ids {
            match entries.entry(id) {
                Entry::Occupied(mut slot) => {
                    if observed_at > *slot.get() {
                        slot.insert(observed_at);
                    }
                }
                Entry::Vacant(slot) => {
                    added.push(slot.key().clone());
                    slot.insert(observed_at);
                }
            }
        }

        added.sort();
        added
    }

    /// Physically remove every entry older than the retention window.
    ///
    /// Removes exactly the entries with `last_seen < now - retention` and
    /// returns their ids; calling it again immediately removes nothing.
    /// Runs independently of discovery so a dead backend never suppresses
    /// the sweep.
    pub fn expire(&self, now: Timestamp, retention: Duration) -> Vec<StoreId> {
        let cutoff = now - retention;
        let mut entries = self.entries.write().expect("registry lock poisoned");

        let mut expired: Vec<StoreId> = entries
            .iter()
            .filter(|(_, last_seen)| **last_seen < cutoff)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            entries.remove(id);
        }

        expired.sort();
        expired
    }

    /// Entries still within the retention window, most recently seen
    /// first.
    ///
    /// Applies the same cutoff as [`expire`](Self::expire), so an entry
    /// past its window is invisible here even before the sweep has
    /// removed it.
    pub fn active_entries(&self, now: Timestamp, retention: Duration) -> Vec<RegistryEntry> {
        let cutoff = now - retention;
        let entries = self.entries.read().expect("registry lock poisoned");

        let mut active: Vec<RegistryEntry> = entries
            .iter()
            .filter(|(_, last_seen)| **last_seen >= cutoff)
            .map(|(id, last_seen)| RegistryEntry {
                store: id.clone(),
                last_seen: *last_seen,
            })
            .collect();

        active.sort_by(|a, b| {
            b.last_seen
                .cmp(&a.last_seen)
                .then_with(|| a.store.cmp(&b.store))
        });
        active
    }

    /// Number of active entries; cheaper than materializing the list.
    pub fn active_count(&self, now: Timestamp, retention: Duration) -> usize {
        let cutoff = now - retention;
        let entries = self.entries.read().expect("registry lock poisoned");
        entries.values().filter(|last_seen| **last_seen >= cutoff).count()
    }

    /// Total entry count, including logically expired but unswept ones.
    pub fn len(&self) -> usize {
        self.entries.read().expect("registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Atomically-obtained copy of the full mapping, for persistence.
    pub fn snapshot(&self) -> HashMap<StoreId, Timestamp> {
        self.entries.read().expect("registry lock poisoned").clone()
    }

    /// Record the outcome of a reconciliation attempt.
    pub fn record_sync(&self, at: Timestamp, error: Option<String>) {
        let mut sync = self.sync.write().expect("sync status lock poisoned");
        sync.last_sync = Some(at);
        sync.last_error = error;
    }

    /// Snapshot of the last reconciliation outcome.
    pub fn sync_status(&self) -> SyncStatus {
        self.sync.read().expect("sync status lock poisoned").clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
