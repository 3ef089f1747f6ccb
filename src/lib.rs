//! Proxy Vet - Concurrent Proxy Checker
//!
//! Validates lists of candidate proxies by routing a lightweight probe
//! through each one, with bounded concurrency, a single retry sweep
//! for transient failures, and latency-based filtering of the results.

pub mod config;
pub mod proxy;

pub use config::Config;
pub use proxy::*;

/// Application result type
pub type Result<T> = anyhow::Result<T>;
