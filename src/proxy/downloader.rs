//! Proxy list downloader
//!
//! Fetches a raw proxy list from a remote source and extracts proxy
//! entries from it, line by line first and by IP:PORT pattern as a
//! fallback for HTML-ish payloads.

use crate::proxy::parser::ProxyParser;
use crate::Result;
use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::time::Duration;

/// Default timeout for list downloads in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default user agent for list downloads
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Regex pattern to match IP:PORT patterns in text
static IP_PORT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}):(\d{1,5})\b").expect("Invalid IP:PORT regex")
});

/// Downloader for remote proxy lists
pub struct ProxyDownloader {
    client: Client,
}

impl ProxyDownloader {
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    /// Download a proxy list and extract the raw proxy strings
    pub async fn download(&self, url: &str) -> Result<Vec<String>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("failed to download proxy list from {}", url))?;
        let content = response.text().await?;
        Ok(Self::extract_proxies(&content))
    }

    /// Extract proxy strings from raw list content.
    ///
    /// Plain lines that validate as proxies are taken as-is; if none
    /// validate, IP:PORT pairs are pulled out by pattern matching.
    /// Duplicates are removed preserving first appearance.
    pub fn extract_proxies(content: &str) -> Vec<String> {
        let mut proxies: Vec<String> = ProxyParser::raw_lines(content)
            .into_iter()
            .filter(|line| ProxyParser::validate(line))
            .collect();

        if proxies.is_empty() {
            proxies = Self::extract_with_regex(content);
        }

        let mut seen = std::collections::HashSet::new();
        proxies.retain(|p| seen.insert(p.clone()));
        proxies
    }

    fn extract_with_regex(content: &str) -> Vec<String> {
        IP_PORT_REGEX
            .captures_iter(content)
            .filter_map(|cap| {
                let host = cap.get(1)?.as_str();
                let port = cap.get(2)?.as_str();
                let candidate = format!("{}:{}", host, port);

                for octet in host.split('.') {
                    let num: u32 = octet.parse().ok()?;
                    if num > 255 {
                        return None;
                    }
                }

                ProxyParser::validate(&candidate).then_some(candidate)
            })
            .collect()
    }
}
