//! Proxy checker driving bounded-concurrency probe batches

use crate::proxy::filter::SpeedFilter;
use crate::proxy::models::CheckOutcome;
use crate::proxy::parser::ProxyParser;
use crate::proxy::prober::{Prober, ProxyTransport, ReqwestTransport};
use crate::proxy::report::CheckReport;
use crate::proxy::retry::RetryManager;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info};

/// Default timeout for proxy checks in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Default number of concurrent checks
const DEFAULT_CONCURRENCY: usize = 20;

/// Default URL to test proxies against
const DEFAULT_TEST_URL: &str = "https://www.google.com";

/// Progress is printed after this many completed attempts
const PROGRESS_EVERY: usize = 5;

/// Configuration for the proxy checker
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Timeout for each proxy check
    pub timeout: Duration,
    /// Maximum number of probes in flight at once
    pub concurrency: usize,
    /// URLs to test proxies against; one is chosen per probe
    pub test_urls: Vec<String>,
    /// Extra attempts granted to a failed proxy
    pub retry_count: u32,
    /// Latency window applied to working proxies
    pub speed_filter: SpeedFilter,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            test_urls: vec![DEFAULT_TEST_URL.to_string()],
            retry_count: 0,
            speed_filter: SpeedFilter::default(),
        }
    }
}

impl CheckerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_test_urls(mut self, urls: Vec<String>) -> Self {
        if !urls.is_empty() {
            self.test_urls = urls;
        }
        self
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn with_speed_filter(mut self, filter: SpeedFilter) -> Self {
        self.speed_filter = filter;
        self
    }
}

/// Running totals for the progress stream
struct Progress {
    processed: usize,
    planned: usize,
}

impl Progress {
    fn note_completion(&mut self) {
        self.processed += 1;
        if self.at_checkpoint() {
            println!("{}", self.status_line());
        }
    }

    fn at_checkpoint(&self) -> bool {
        self.processed % PROGRESS_EVERY == 0
    }

    /// Print the closing progress line once all attempts, including
    /// any retry sweep, have completed
    fn finish(&self) {
        if self.planned > 0 && !self.at_checkpoint() {
            println!("{}", self.status_line());
        }
    }

    fn status_line(&self) -> String {
        let percent = (self.processed as f64 / self.planned as f64 * 100.0).round();
        format!(
            "Progress: {}/{} ({}%)",
            self.processed, self.planned, percent
        )
    }
}

/// Proxy checker for validating proxy lists
pub struct ProxyChecker {
    config: CheckerConfig,
    prober: Arc<Prober>,
}

impl ProxyChecker {
    /// Create a checker with the reqwest-backed transport
    pub fn with_config(config: CheckerConfig) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport))
    }

    /// Create a checker over a custom transport
    pub fn with_transport(config: CheckerConfig, transport: Arc<dyn ProxyTransport>) -> Self {
        let prober = Arc::new(Prober::new(
            Arc::clone(&transport),
            config.test_urls.clone(),
            config.timeout,
        ));
        Self { config, prober }
    }

    /// Check every proxy in the list and aggregate the results.
    ///
    /// Runs one full pass over the input in batches of twice the
    /// concurrency limit, then a single retry sweep over the backlog
    /// accumulated during that pass. Per-proxy failures never abort
    /// the run.
    pub async fn run(&self, proxies: Vec<String>) -> CheckReport {
        // The raw string is the run's natural key; duplicate input
        // entries collapse to a single probe.
        let mut seen = HashSet::new();
        let proxies: Vec<String> = proxies
            .into_iter()
            .filter(|p| seen.insert(p.clone()))
            .collect();

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut retry = RetryManager::new(self.config.retry_count);
        let mut completed: Vec<CheckOutcome> = Vec::new();
        let mut progress = Progress {
            processed: 0,
            planned: proxies.len(),
        };

        println!("Starting proxy check of {} proxies...", proxies.len());

        self.run_pass(&proxies, &semaphore, &mut retry, &mut progress, &mut completed)
            .await;

        let backlog = retry.drain_retryable();
        if !backlog.is_empty() {
            info!(count = backlog.len(), "starting retry sweep");
            println!("Retrying {} failed proxies...", backlog.len());
            progress.planned += backlog.len();
            self.run_pass(&backlog, &semaphore, &mut retry, &mut progress, &mut completed)
                .await;
        }
        progress.finish();

        CheckReport::aggregate(Self::latest_per_proxy(completed), &self.config.speed_filter)
    }

    /// One pass over a proxy list: dispatch in batches, drain each
    /// batch fully, then do retry bookkeeping at the batch boundary.
    async fn run_pass(
        &self,
        proxies: &[String],
        semaphore: &Arc<Semaphore>,
        retry: &mut RetryManager,
        progress: &mut Progress,
        completed: &mut Vec<CheckOutcome>,
    ) {
        let batch_size = (self.config.concurrency * 2).max(1);

        for batch in proxies.chunks(batch_size) {
            let probes: Vec<_> = batch
                .iter()
                .map(|raw| {
                    let raw = raw.clone();
                    let attempt = retry.attempts_for(&raw);
                    let sem = Arc::clone(semaphore);
                    let prober = Arc::clone(&self.prober);
                    async move {
                        // Malformed entries are rejected before they
                        // consume a concurrency slot.
                        if let Err(e) = ProxyParser::parse(&raw) {
                            return CheckOutcome::failed(raw, e, attempt);
                        }
                        let _permit = sem
                            .acquire()
                            .await
                            .expect("Semaphore closed unexpectedly");
                        prober.probe(&raw, attempt).await
                    }
                })
                .collect();

            let mut outcomes = Vec::with_capacity(batch.len());
            let mut in_flight = stream::iter(probes).buffer_unordered(batch_size);
            while let Some(outcome) = in_flight.next().await {
                self.report_outcome(&outcome);
                progress.note_completion();
                outcomes.push(outcome);
            }

            debug!(batch = outcomes.len(), "batch drained");
            for outcome in outcomes {
                retry.record(&outcome);
                completed.push(outcome);
            }
        }
    }

    /// Per-proxy status line, in completion order
    fn report_outcome(&self, outcome: &CheckOutcome) {
        if outcome.working {
            let speed = outcome.speed_ms.unwrap_or(0);
            if self.config.speed_filter.admit(outcome) {
                println!(
                    "✅ Working: {} ({}ms, {})",
                    outcome.proxy, speed, outcome.category
                );
            } else {
                println!("🔍 Filtered: {} ({}ms)", outcome.proxy, speed);
            }
        } else if outcome.is_timeout() {
            println!("❌ Timeout: {}", outcome.proxy);
        } else {
            println!("❌ Failed: {}", outcome.proxy);
        }
    }

    /// Keep only the latest outcome for each proxy, ordered by the
    /// completion of that final attempt. A retried proxy is matched
    /// back by its raw string, never by list position.
    fn latest_per_proxy(completed: Vec<CheckOutcome>) -> Vec<CheckOutcome> {
        let mut seen = HashSet::new();
        let mut latest: Vec<CheckOutcome> = completed
            .into_iter()
            .rev()
            .filter(|outcome| seen.insert(outcome.proxy.clone()))
            .collect();
        latest.reverse();
        latest
    }
}
