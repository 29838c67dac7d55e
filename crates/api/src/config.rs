use std::path::PathBuf;

/// Exporter configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    /// Bind address for both listeners (default: `0.0.0.0`).
    pub host: String,
    /// Prometheus exposition port (default: `9095`).
    pub metrics_port: u16,
    /// Status/listing API port (default: `8080`).
    pub web_port: u16,
    /// Path of the persisted registry file.
    pub registry_file: PathBuf,
    /// Base URL of the monitoring backend.
    pub prometheus_url: String,
    /// Regex for the `job` label of store `up` series.
    pub job_selector: String,
    /// Maximum observation age (seconds) still counted as live.
    pub staleness_secs: u64,
    /// Seconds between reconciliation cycles.
    pub sync_interval_secs: u64,
    /// Days a store is kept after its last appearance.
    pub retention_days: i64,
    /// HTTP request timeout in seconds for the API listener.
    pub request_timeout_secs: u64,
}

impl ExporterConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                              |
    /// |------------------------|--------------------------------------|
    /// | `HOST`                 | `0.0.0.0`                            |
    /// | `METRICS_PORT`         | `9095`                               |
    /// | `WEB_PORT`             | `8080`                               |
    /// | `REGISTRY_FILE`        | `store-registry-state.json`          |
    /// | `PROMETHEUS_URL`       | `http://localhost:9090`              |
    /// | `STORE_JOB_SELECTOR`   | `retail_windows\|retail_mikrotik`    |
    /// | `STALENESS_SEC`        | `120`                                |
    /// | `SYNC_INTERVAL_SECS`   | `300`                                |
    /// | `RETENTION_DAYS`       | `30`                                 |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                                 |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let metrics_port: u16 = std::env::var("METRICS_PORT")
            .unwrap_or_else(|_| "9095".into())
            .parse()
            .expect("METRICS_PORT must be a valid u16");

        let web_port: u16 = std::env::var("WEB_PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .expect("WEB_PORT must be a valid u16");

        let registry_file = PathBuf::from(
            std::env::var("REGISTRY_FILE").unwrap_or_else(|_| "store-registry-state.json".into()),
        );

        let prometheus_url =
            std::env::var("PROMETHEUS_URL").unwrap_or_else(|_| "http://localhost:9090".into());

        let job_selector = std::env::var("STORE_JOB_SELECTOR")
            .unwrap_or_else(|_| "retail_windows|retail_mikrotik".into());

        let staleness_secs: u64 = std::env::var("STALENESS_SEC")
            .unwrap_or_else(|_| "120".into())
            .parse()
            .expect("STALENESS_SEC must be a valid u64");

        let sync_interval_secs: u64 = std::env::var("SYNC_INTERVAL_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("SYNC_INTERVAL_SECS must be a valid u64");

        let retention_days: i64 = std::env::var("RETENTION_DAYS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("RETENTION_DAYS must be a valid i64");

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            metrics_port,
            web_port,
            registry_file,
            prometheus_url,
            job_selector,
            staleness_secs,
            sync_interval_secs,
            retention_days,
            request_timeout_secs,
        }
    }

    /// Retention window as a chrono duration.
    pub fn retention_window(&self) -> chrono::Duration {
        chrono::Duration::days(self.retention_days)
    }

    /// Reconciliation interval as a std duration.
    pub fn sync_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sync_interval_secs)
    }
}
