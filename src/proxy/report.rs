//! Aggregation of check outcomes into the final report

use crate::proxy::filter::SpeedFilter;
use crate::proxy::models::{CheckOutcome, SpeedCategory};
use crate::Result;
use serde::Serialize;

/// Counts per speed category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryHistogram {
    pub fast: usize,
    pub medium: usize,
    pub slow: usize,
    pub unknown: usize,
}

impl CategoryHistogram {
    fn bump(&mut self, category: SpeedCategory) {
        match category {
            SpeedCategory::Fast => self.fast += 1,
            SpeedCategory::Medium => self.medium += 1,
            SpeedCategory::Slow => self.slow += 1,
            SpeedCategory::Unknown => self.unknown += 1,
        }
    }
}

/// Serializable record for one working proxy
#[derive(Debug, Clone, Serialize)]
pub struct ProxyRecord {
    pub proxy: String,
    pub working: bool,
    pub speed_ms: Option<u64>,
    pub category: SpeedCategory,
    pub attempts: u32,
    pub success_rate: f64,
}

impl ProxyRecord {
    fn from_outcome(outcome: &CheckOutcome) -> Self {
        let attempts = outcome.attempt + 1;
        Self {
            proxy: outcome.proxy.clone(),
            working: outcome.working,
            speed_ms: outcome.speed_ms,
            category: outcome.category,
            attempts,
            success_rate: if outcome.working {
                1.0 / f64::from(attempts)
            } else {
                0.0
            },
        }
    }
}

/// Final report of a check run.
///
/// `working_set` preserves completion order, not input order;
/// concurrent completion reorders results.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    /// Number of distinct proxies checked
    pub total: usize,
    pub working: usize,
    pub filtered: usize,
    pub failed: usize,
    pub histogram: CategoryHistogram,
    pub working_set: Vec<CheckOutcome>,
}

impl CheckReport {
    /// Aggregate the final outcome of every proxy (one per proxy, the
    /// latest attempt, in completion order) under the given filter.
    pub fn aggregate(outcomes: Vec<CheckOutcome>, filter: &SpeedFilter) -> Self {
        let mut histogram = CategoryHistogram::default();
        let mut working = 0;
        let mut filtered = 0;
        let mut failed = 0;
        let mut working_set = Vec::new();

        let total = outcomes.len();
        for outcome in outcomes {
            histogram.bump(outcome.category);
            if !outcome.working {
                failed += 1;
            } else if filter.admit(&outcome) {
                working += 1;
                working_set.push(outcome);
            } else {
                filtered += 1;
            }
        }

        Self {
            total,
            working,
            filtered,
            failed,
            histogram,
            working_set,
        }
    }

    /// Newline-joined list of working proxy strings
    pub fn plain_list(&self) -> String {
        self.working_set
            .iter()
            .map(|o| o.proxy.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Structured records for the working set, same order as the
    /// plain list so the two artifacts never diverge
    pub fn records(&self) -> Vec<ProxyRecord> {
        self.working_set.iter().map(ProxyRecord::from_outcome).collect()
    }

    /// Serialize the structured records to pretty JSON
    pub fn records_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.records())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::models::CheckError;

    fn outcomes() -> Vec<CheckOutcome> {
        vec![
            CheckOutcome::working("1.1.1.1:8080".into(), 100, 0),
            CheckOutcome::working("2.2.2.2:8080".into(), 700, 0),
            CheckOutcome::working("3.3.3.3:8080".into(), 1500, 1),
            CheckOutcome::failed("4.4.4.4:8080".into(), CheckError::Timeout, 1),
        ]
    }

    #[test]
    fn test_aggregate_counts() {
        let report = CheckReport::aggregate(outcomes(), &SpeedFilter::default());
        assert_eq!(report.total, 4);
        assert_eq!(report.working, 3);
        assert_eq!(report.filtered, 0);
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn test_aggregate_histogram() {
        let report = CheckReport::aggregate(outcomes(), &SpeedFilter::default());
        assert_eq!(report.histogram.fast, 1);
        assert_eq!(report.histogram.medium, 1);
        assert_eq!(report.histogram.slow, 1);
        assert_eq!(report.histogram.unknown, 1);
    }

    #[test]
    fn test_filtered_counted_separately_from_failed() {
        let filter = SpeedFilter {
            enabled: true,
            min_speed: 0,
            max_speed: 50,
        };
        let report = CheckReport::aggregate(outcomes(), &filter);
        assert_eq!(report.working, 0);
        assert_eq!(report.filtered, 3);
        assert_eq!(report.failed, 1);
        // Categories are attached regardless of filtering
        assert_eq!(report.histogram.fast, 1);
        assert_eq!(report.histogram.medium, 1);
    }

    #[test]
    fn test_plain_list_matches_records() {
        let report = CheckReport::aggregate(outcomes(), &SpeedFilter::default());
        let plain_list = report.plain_list();
        let plain: Vec<&str> = plain_list.lines().collect();
        let records = report.records();
        assert_eq!(plain.len(), records.len());
        for (line, record) in plain.iter().zip(&records) {
            assert_eq!(*line, record.proxy);
        }
    }

    #[test]
    fn test_record_success_rate() {
        let report = CheckReport::aggregate(outcomes(), &SpeedFilter::default());
        let records = report.records();
        assert_eq!(records[0].attempts, 1);
        assert!((records[0].success_rate - 1.0).abs() < f64::EPSILON);
        assert_eq!(records[2].attempts, 2);
        assert!((records[2].success_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_records_json_shape() {
        let report = CheckReport::aggregate(outcomes(), &SpeedFilter::default());
        let json = report.records_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 3);
        assert_eq!(parsed[0]["proxy"], "1.1.1.1:8080");
        assert_eq!(parsed[0]["category"], "fast");
    }
}
