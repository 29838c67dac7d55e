//! Durable persistence for the store registry.
//!
//! On disk the registry is a flat JSON object of store id to last-seen
//! epoch seconds:
//!
//! ```json
//! { "0101": 1754500000, "0102": 1754500123 }
//! ```
//!
//! Corruption is non-fatal: a malformed file loads as an empty registry
//! (the registry rebuilds itself from live discovery) and is overwritten
//! on the next save. Saves go through a temp file followed by a rename so
//! a crash mid-write never leaves a half-written file behind.
//!
//! A legacy format -- a bare JSON array of store ids with no timestamps --
//! is migrated once at startup: every id gets stamped with the migration
//! time and the registry is persisted in the new format. The legacy file
//! is never consulted again because the timestamped file now exists.

use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use storereg_core::types::{StoreId, Timestamp};

/// File name of the legacy bare-id-list registry, looked up next to the
/// primary registry file.
const LEGACY_FILE_NAME: &str = "stores-registry.json";

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Handle to the registry state file.
pub struct RegistryStore {
    path: PathBuf,
    legacy_path: PathBuf,
}

impl RegistryStore {
    /// Create a store for the given registry file path. The legacy file
    /// is expected in the same directory.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let legacy_path = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
            .join(LEGACY_FILE_NAME);
        Self { path, legacy_path }
    }

    /// Path of the primary registry file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted registry.
    ///
    /// A missing file yields an empty registry; so does a malformed one
    /// (logged, overwritten on the next save).
    pub async fn load(&self) -> HashMap<StoreId, Timestamp> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => parse_registry(&bytes, &self.path),
            Err(e) if e.kind() == ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read registry file, starting empty");
                HashMap::new()
            }
        }
    }

    /// Load the registry, falling back to a one-time migration of the
    /// legacy bare-id-list file if the primary file does not exist yet.
    pub async fn load_or_migrate(&self, now: Timestamp) -> HashMap<StoreId, Timestamp> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => parse_registry(&bytes, &self.path),
            Err(e) if e.kind() == ErrorKind::NotFound => self.migrate_legacy(now).await,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read registry file, starting empty");
                HashMap::new()
            }
        }
    }

    /// Atomically persist the full mapping, replacing the previous file.
    pub async fn save(&self, entries: &HashMap<StoreId, Timestamp>) -> Result<(), StateError> {
        // Sorted keys keep the file diffable between saves.
        let snapshot: BTreeMap<&str, i64> = entries
            .iter()
            .map(|(id, last_seen)| (id.as_str(), last_seen.timestamp()))
            .collect();
        let json = serde_json::to_vec_pretty(&snapshot)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&json).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Read the legacy bare-id-list file, stamp every id with `now` and
    /// persist once in the timestamped format.
    async fn migrate_legacy(&self, now: Timestamp) -> HashMap<StoreId, Timestamp> {
        let bytes = match tokio::fs::read(&self.legacy_path).await {
            Ok(bytes) => bytes,
            Err(_) => return HashMap::new(),
        };

        let stores: Vec<StoreId> = match serde_json::from_slice(&bytes) {
            Ok(stores) => stores,
            Err(e) => {
                tracing::warn!(path = %self.legacy_path.display(), error = %e, "Legacy registry file is malformed, starting empty");
                return HashMap::new();
            }
        };

        let entries: HashMap<StoreId, Timestamp> =
            stores.into_iter().map(|store| (store, now)).collect();

        match self.save(&entries).await {
            Ok(()) => {
                tracing::info!(count = entries.len(), path = %self.path.display(), "Migrated legacy registry to timestamped format");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to persist migrated registry; migration will rerun on next start");
            }
        }

        entries
    }
}

/// Parse the timestamped registry format. Values are accepted as any JSON
/// number -- older files written with fractional epoch seconds load fine.
fn parse_registry(bytes: &[u8], path: &Path) -> HashMap<StoreId, Timestamp> {
    let raw: HashMap<StoreId, f64> = match serde_json::from_slice(bytes) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Registry file is malformed, starting empty");
            return HashMap::new();
        }
    };

    raw.into_iter()
        .filter_map(|(store, secs)| {
            match chrono::DateTime::from_timestamp(secs as i64, 0) {
                Some(last_seen) => Some((store, last_seen)),
                None => {
                    tracing::warn!(%store, secs, "Dropping entry with out-of-range timestamp");
                    None
                }
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
