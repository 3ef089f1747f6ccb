//! Single-probe execution against a test URL through one proxy

use crate::proxy::models::{CheckError, CheckOutcome, Proxy, ProxyType};
use crate::proxy::parser::ProxyParser;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::{Client, Proxy as ReqwestProxy};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Connection capability that routes an HTTP request through a proxy.
///
/// The production implementation is reqwest-backed; tests substitute
/// deterministic mocks.
#[async_trait]
pub trait ProxyTransport: Send + Sync {
    /// Issue a HEAD request to `url` through `proxy` and return the
    /// response status code.
    async fn head(
        &self,
        proxy: &Proxy,
        url: &str,
        timeout: Duration,
    ) -> std::result::Result<u16, CheckError>;
}

/// Proxy-aware HTTP transport backed by reqwest
pub struct ReqwestTransport;

impl ReqwestTransport {
    fn build_client(
        proxy: &Proxy,
        timeout: Duration,
    ) -> std::result::Result<Client, CheckError> {
        let proxy_url = proxy.url();

        let reqwest_proxy = match proxy.proxy_type {
            ProxyType::Http | ProxyType::Https => ReqwestProxy::http(&proxy_url),
            ProxyType::Socks4 | ProxyType::Socks5 => ReqwestProxy::all(&proxy_url),
        }
        .map_err(|e| CheckError::ConnectionFailure(e.to_string()))?;

        Client::builder()
            .proxy(reqwest_proxy)
            .timeout(timeout)
            .build()
            .map_err(|e| CheckError::ConnectionFailure(e.to_string()))
    }
}

#[async_trait]
impl ProxyTransport for ReqwestTransport {
    async fn head(
        &self,
        proxy: &Proxy,
        url: &str,
        timeout: Duration,
    ) -> std::result::Result<u16, CheckError> {
        let client = Self::build_client(proxy, timeout)?;

        match client.head(url).send().await {
            Ok(response) => Ok(response.status().as_u16()),
            Err(e) if e.is_timeout() => Err(CheckError::Timeout),
            Err(e) => Err(CheckError::ConnectionFailure(e.to_string())),
        }
    }
}

/// Executes one timed probe per call and classifies the outcome
pub struct Prober {
    transport: Arc<dyn ProxyTransport>,
    test_urls: Vec<String>,
    timeout: Duration,
}

impl Prober {
    pub fn new(transport: Arc<dyn ProxyTransport>, test_urls: Vec<String>, timeout: Duration) -> Self {
        Self {
            transport,
            test_urls,
            timeout,
        }
    }

    /// Probe one raw proxy string.
    ///
    /// The elapsed time runs from request start to response headers.
    /// Any transport error or timeout is contained in the returned
    /// outcome; this never aborts the run. An outer ceiling of twice
    /// the configured timeout guards against a transport that ignores
    /// its own timeout.
    pub async fn probe(&self, raw: &str, attempt: u32) -> CheckOutcome {
        let proxy = match ProxyParser::parse(raw) {
            Ok(proxy) => proxy,
            Err(e) => return CheckOutcome::failed(raw.to_string(), e, attempt),
        };

        let url = self
            .test_urls
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_default();

        let start = Instant::now();
        let result = tokio::time::timeout(
            self.timeout * 2,
            self.transport.head(&proxy, &url, self.timeout),
        )
        .await;

        match result {
            Ok(Ok(status)) if (200..300).contains(&status) => {
                let elapsed = start.elapsed().as_millis() as u64;
                CheckOutcome::working(raw.to_string(), elapsed, attempt)
            }
            Ok(Ok(status)) => {
                CheckOutcome::failed(raw.to_string(), CheckError::UnexpectedStatus(status), attempt)
            }
            Ok(Err(e)) => CheckOutcome::failed(raw.to_string(), e, attempt),
            Err(_) => CheckOutcome::failed(raw.to_string(), CheckError::Timeout, attempt),
        }
    }
}
