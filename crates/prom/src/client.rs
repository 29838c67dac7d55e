//! Instant-query client against the Prometheus HTTP API.
//!
//! Discovery asks the backend which stores are up *and* have reported
//! within the staleness threshold. The freshness clause is mandatory:
//! with remote write the backend never marks a series stale and keeps
//! returning the last value for five minutes or more after a site's
//! agent stops, so `up == 1` alone would keep a dead store "online".

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use storereg_core::error::CoreError;
use storereg_core::freshness::FreshnessSource;
use storereg_core::types::StoreId;

/// Label that identifies a store in backend time series.
const STORE_LABEL: &str = "store";

/// Bound on a single backend query round-trip. A timeout is treated the
/// same as any other backend error.
const QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for one Prometheus-compatible backend.
pub struct PromClient {
    base_url: String,
    job_selector: String,
    staleness_secs: u64,
    http: reqwest::Client,
}

#[derive(Debug, thiserror::Error)]
pub enum PromError {
    /// Transport-level failure: connect error, timeout, non-2xx status.
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered but reported a query failure.
    #[error("Backend returned error: {0}")]
    Backend(String),
}

/// Top-level instant-query response envelope.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    status: String,
    #[serde(default)]
    data: Option<QueryData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(default)]
    result: Vec<Sample>,
}

/// One instant-vector sample: label set plus `[timestamp, value]`.
#[derive(Debug, Deserialize)]
pub struct Sample {
    #[serde(default)]
    pub metric: HashMap<String, String>,
    pub value: (f64, String),
}

impl PromClient {
    /// Create a client for the given backend.
    ///
    /// * `base_url`       - backend base URL, e.g. `http://prometheus:9090`.
    /// * `job_selector`   - regex for the `job` label of store `up` series.
    /// * `staleness_secs` - maximum observation age still counted as live.
    pub fn new(base_url: impl Into<String>, job_selector: impl Into<String>, staleness_secs: u64) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            job_selector: job_selector.into(),
            staleness_secs,
            http: reqwest::Client::new(),
        }
    }

    /// Backend base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The freshness-filtered discovery expression.
    pub fn freshness_query(&self) -> String {
        format!(
            "max by ({label}) (up{{job=~\"{sel}\"}} and (time() - timestamp(up{{job=~\"{sel}\"}}) < {staleness}))",
            label = STORE_LABEL,
            sel = self.job_selector,
            staleness = self.staleness_secs,
        )
    }

    /// Run an instant query and return the raw sample vector.
    pub async fn instant_query(&self, query: &str) -> Result<Vec<Sample>, PromError> {
        let url = format!("{}/api/v1/query", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("query", query)])
            .timeout(QUERY_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;

        let body: QueryResponse = response.json().await?;
        if body.status != "success" {
            return Err(PromError::Backend(
                body.error.unwrap_or_else(|| "unknown".to_string()),
            ));
        }

        Ok(body.data.map(|data| data.result).unwrap_or_default())
    }

    /// Extract the online store set from discovery samples: only samples
    /// with value `1` and a store label count.
    fn online_from_samples(samples: Vec<Sample>) -> BTreeSet<StoreId> {
        samples
            .into_iter()
            .filter(|sample| sample.value.1 == "1")
            .filter_map(|mut sample| sample.metric.remove(STORE_LABEL))
            .collect()
    }
}

#[async_trait]
impl FreshnessSource for PromClient {
    async fn online_now(&self) -> Result<BTreeSet<StoreId>, CoreError> {
        let query = self.freshness_query();
        let samples = self
            .instant_query(&query)
            .await
            .map_err(|e| CoreError::Backend(e.to_string()))?;

        let online = Self::online_from_samples(samples);
        tracing::debug!(count = online.len(), "Backend discovery query completed");
        Ok(online)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
