//! Prometheus exposition of the expected-store registry.
//!
//! The gauge is rebuilt from the engine's active set on every scrape, so
//! the exposition always reflects the logical (read-time filtered) view
//! regardless of when the physical sweep last ran.

use prometheus::{IntGaugeVec, Opts, Registry, TextEncoder};

use storereg_core::registry::RegistryEntry;

/// Name of the synthetic presence gauge.
pub const EXPECTED_METRIC: &str = "retail_store_expected";

/// Render one `retail_store_expected{store="..."} 1` sample per active
/// entry in the text exposition format.
pub fn render(entries: &[RegistryEntry]) -> Result<String, prometheus::Error> {
    let registry = Registry::new();
    let gauge = IntGaugeVec::new(
        Opts::new(
            EXPECTED_METRIC,
            "Store expected to be online (registry-managed, auto-refreshed)",
        ),
        &["store"],
    )?;
    registry.register(Box::new(gauge.clone()))?;

    for entry in entries {
        gauge.with_label_values(&[entry.store.as_str()]).set(1);
    }

    TextEncoder::new().encode_to_string(&registry.gather())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
