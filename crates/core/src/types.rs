/// Identifier of a monitored retail site, as reported in the backend's
/// `store` label.
pub type StoreId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
