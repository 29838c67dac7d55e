#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The monitoring backend was unreachable or answered with a
    /// non-success payload. The registry is left untouched for the
    /// cycle; expiry and persistence still proceed.
    #[error("Backend query failed: {0}")]
    Backend(String),
}
