//! Abstract discovery seam: "which stores are online right now?"
//!
//! Implementations must filter by observation freshness themselves.
//! Backends that receive samples via remote write keep answering with the
//! last known value long after a site goes dark, so a plain "is a value
//! present" check would never mark a store offline. The contract here is
//! that every returned id was observed within the implementation's
//! staleness threshold at call time.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::error::CoreError;
use crate::types::StoreId;

/// Source of the current online store set, queried once per
/// reconciliation cycle.
#[async_trait]
pub trait FreshnessSource: Send + Sync {
    /// Return the set of stores observed online within the staleness
    /// threshold.
    ///
    /// On error the caller must treat the registry as unchanged for the
    /// cycle -- no stores added, none touched -- but still run expiry.
    async fn online_now(&self) -> Result<BTreeSet<StoreId>, CoreError>;
}
