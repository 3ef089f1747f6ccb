//! Retry bookkeeping between probe batches
//!
//! The attempts map is owned by the checker's coordinating task and is
//! only touched between batches, never while a probe for the same
//! proxy is in flight.

use crate::proxy::models::CheckOutcome;
use std::collections::HashMap;

/// Tracks per-proxy attempt counts and the retry backlog
#[derive(Debug, Default)]
pub struct RetryManager {
    max_retries: u32,
    attempts: HashMap<String, u32>,
    backlog: Vec<String>,
}

impl RetryManager {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            attempts: HashMap::new(),
            backlog: Vec::new(),
        }
    }

    /// Number of attempts already made for a proxy; the next attempt
    /// index equals this value.
    pub fn attempts_for(&self, proxy: &str) -> u32 {
        self.attempts.get(proxy).copied().unwrap_or(0)
    }

    /// A failed proxy is retried while `attempts_so_far <= max_retries`
    /// (total attempts = max_retries + 1).
    pub fn should_retry(&self, attempts_so_far: u32) -> bool {
        attempts_so_far <= self.max_retries
    }

    /// Record a completed attempt. Failed outcomes with a transient
    /// error and attempts remaining join the backlog; structural
    /// failures (invalid format, unsupported protocol) never do.
    pub fn record(&mut self, outcome: &CheckOutcome) {
        let attempts = self.attempts.entry(outcome.proxy.clone()).or_insert(0);
        *attempts += 1;
        let attempts = *attempts;

        if outcome.is_retriable_failure() && self.should_retry(attempts) {
            self.backlog.push(outcome.proxy.clone());
        }
    }

    /// Take the accumulated backlog for the retry sweep
    pub fn drain_retryable(&mut self) -> Vec<String> {
        std::mem::take(&mut self.backlog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::models::CheckError;

    fn failed(proxy: &str, error: CheckError, attempt: u32) -> CheckOutcome {
        CheckOutcome::failed(proxy.to_string(), error, attempt)
    }

    #[test]
    fn test_should_retry_inclusive_bound() {
        let manager = RetryManager::new(1);
        assert!(manager.should_retry(0));
        assert!(manager.should_retry(1));
        assert!(!manager.should_retry(2));
    }

    #[test]
    fn test_no_retries_when_count_zero() {
        let mut manager = RetryManager::new(0);
        manager.record(&failed("1.2.3.4:8080", CheckError::Timeout, 0));
        assert!(manager.drain_retryable().is_empty());
    }

    #[test]
    fn test_transient_failure_joins_backlog() {
        let mut manager = RetryManager::new(1);
        manager.record(&failed(
            "1.2.3.4:8080",
            CheckError::ConnectionFailure("refused".into()),
            0,
        ));
        assert_eq!(manager.drain_retryable(), vec!["1.2.3.4:8080".to_string()]);
        assert_eq!(manager.attempts_for("1.2.3.4:8080"), 1);
    }

    #[test]
    fn test_structural_failure_never_retried() {
        let mut manager = RetryManager::new(3);
        manager.record(&failed(
            "bad::entry",
            CheckError::InvalidFormat("bad::entry".into()),
            0,
        ));
        assert!(manager.drain_retryable().is_empty());
    }

    #[test]
    fn test_working_outcome_not_requeued() {
        let mut manager = RetryManager::new(1);
        manager.record(&CheckOutcome::working("1.2.3.4:8080".into(), 50, 0));
        assert!(manager.drain_retryable().is_empty());
        assert_eq!(manager.attempts_for("1.2.3.4:8080"), 1);
    }

    #[test]
    fn test_exhausted_retries_leave_backlog_empty() {
        let mut manager = RetryManager::new(1);
        manager.record(&failed("1.2.3.4:8080", CheckError::Timeout, 0));
        assert_eq!(manager.drain_retryable().len(), 1);
        manager.record(&failed("1.2.3.4:8080", CheckError::Timeout, 1));
        assert!(manager.drain_retryable().is_empty());
    }

    #[test]
    fn test_drain_resets_backlog() {
        let mut manager = RetryManager::new(2);
        manager.record(&failed("1.2.3.4:8080", CheckError::Timeout, 0));
        assert_eq!(manager.drain_retryable().len(), 1);
        assert!(manager.drain_retryable().is_empty());
    }
}
