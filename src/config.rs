//! Application configuration
//!
//! Loaded from a JSON file with the same layout the companion scripts
//! use; missing or malformed files fall back to the documented
//! defaults so a run can always proceed.

use crate::proxy::filter::SpeedFilter;
use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

fn default_proxy_url() -> String {
    "https://raw.githubusercontent.com/monosans/proxy-list/refs/heads/main/proxies/all.txt"
        .to_string()
}

fn default_proxy_file() -> String {
    "data/proxy.txt".to_string()
}

fn default_output_file() -> String {
    "data/working_proxies.txt".to_string()
}

fn default_results_file() -> String {
    "data/check_results.json".to_string()
}

fn default_test_urls() -> Vec<String> {
    vec![
        "https://www.google.com".to_string(),
        "https://www.cloudflare.com".to_string(),
        "https://www.microsoft.com".to_string(),
        "https://www.amazon.com".to_string(),
        "https://www.github.com".to_string(),
    ]
}

fn default_timeout() -> u64 {
    5
}

fn default_concurrent_checks() -> usize {
    20
}

fn default_retry_count() -> u32 {
    1
}

/// Configuration record for a check run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote source of the raw proxy list
    pub proxy_url: String,
    /// Input file of raw proxy strings, one per line
    pub proxy_file: String,
    /// Output file for the plain working-proxy list
    pub output_file: String,
    /// Output file for the structured outcome records
    pub results_file: String,
    /// URLs to probe through each proxy; one is chosen per probe
    pub test_urls: Vec<String>,
    /// Per-probe timeout in seconds
    pub timeout: u64,
    /// Maximum number of probes in flight at once
    pub concurrent_checks: usize,
    /// Extra attempts granted to a failed proxy
    pub retry_count: u32,
    /// Write the working list back over the input file
    pub save_to_input_file: bool,
    pub speed_filter: SpeedFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proxy_url: default_proxy_url(),
            proxy_file: default_proxy_file(),
            output_file: default_output_file(),
            results_file: default_results_file(),
            test_urls: default_test_urls(),
            timeout: default_timeout(),
            concurrent_checks: default_concurrent_checks(),
            retry_count: default_retry_count(),
            save_to_input_file: false,
            speed_filter: SpeedFilter::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults
    /// when the file cannot be read or parsed
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!(
                        path = %path.as_ref().display(),
                        error = %e,
                        "malformed config file, using defaults"
                    );
                    Self::default()
                }
            },
            Err(e) => {
                warn!(
                    path = %path.as_ref().display(),
                    error = %e,
                    "could not read config file, using defaults"
                );
                Self::default()
            }
        }
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.test_urls.is_empty(), "test_urls must not be empty");
        ensure!(self.timeout > 0, "timeout must be positive");
        ensure!(
            self.concurrent_checks > 0,
            "concurrent_checks must be positive"
        );
        if self.speed_filter.enabled {
            ensure!(
                self.speed_filter.min_speed <= self.speed_filter.max_speed,
                "speed_filter.min_speed must not exceed max_speed"
            );
        }
        Ok(())
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout, 5);
        assert_eq!(config.concurrent_checks, 20);
        assert_eq!(config.retry_count, 1);
        assert_eq!(config.test_urls.len(), 5);
        assert!(!config.save_to_input_file);
        assert!(!config.speed_filter.enabled);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "proxy_file": "proxies.txt",
                "test_urls": ["http://test.example/"],
                "timeout": 3,
                "concurrent_checks": 50,
                "retry_count": 2,
                "speed_filter": {{"enabled": true, "min_speed": 0, "max_speed": 800}}
            }}"#
        )
        .unwrap();

        let config = Config::load(file.path());
        assert_eq!(config.proxy_file, "proxies.txt");
        assert_eq!(config.test_urls, vec!["http://test.example/".to_string()]);
        assert_eq!(config.timeout, 3);
        assert_eq!(config.concurrent_checks, 50);
        assert_eq!(config.retry_count, 2);
        assert!(config.speed_filter.enabled);
        assert_eq!(config.speed_filter.max_speed, 800);
        // unset fields keep their defaults
        assert_eq!(config.output_file, "data/working_proxies.txt");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = Config::load("no/such/config.json");
        assert_eq!(config.timeout, Config::default().timeout);
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json at all").unwrap();
        let config = Config::load(file.path());
        assert_eq!(config.concurrent_checks, 20);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config {
            timeout: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        config.timeout = 5;
        config.concurrent_checks = 0;
        assert!(config.validate().is_err());

        config.concurrent_checks = 10;
        config.test_urls.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_speed_window() {
        let config = Config {
            speed_filter: SpeedFilter {
                enabled: true,
                min_speed: 900,
                max_speed: 100,
            },
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
