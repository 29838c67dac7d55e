//! Prometheus HTTP API client for store discovery.
//!
//! Implements [`storereg_core::freshness::FreshnessSource`] on top of the
//! backend's instant-query endpoint.

pub mod client;

pub use client::{PromClient, PromError};
