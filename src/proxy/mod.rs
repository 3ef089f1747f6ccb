//! Proxy module for parsing and checking proxies
//!
//! This module provides functionality for:
//! - Parsing raw proxy strings in the common list formats
//! - Probing proxies concurrently with a hard concurrency bound
//! - Retrying transient failures in a single extra sweep
//! - Filtering and categorizing working proxies by speed
//! - Downloading raw proxy lists from remote sources

pub mod checker;
pub mod downloader;
pub mod filter;
pub mod models;
pub mod parser;
pub mod prober;
pub mod report;
pub mod retry;

pub use checker::{CheckerConfig, ProxyChecker};
pub use downloader::ProxyDownloader;
pub use filter::SpeedFilter;
pub use models::{CheckError, CheckOutcome, Proxy, ProxyAuth, ProxyType, SpeedCategory};
pub use parser::ProxyParser;
pub use prober::{Prober, ProxyTransport, ReqwestTransport};
pub use report::{CategoryHistogram, CheckReport, ProxyRecord};
pub use retry::RetryManager;
