//! Latency window filtering for working proxies

use crate::proxy::models::CheckOutcome;
use serde::{Deserialize, Serialize};

/// Optional latency window applied to working outcomes (milliseconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedFilter {
    pub enabled: bool,
    pub min_speed: u64,
    pub max_speed: u64,
}

impl Default for SpeedFilter {
    fn default() -> Self {
        Self {
            enabled: false,
            min_speed: 0,
            max_speed: 1000,
        }
    }
}

impl SpeedFilter {
    /// Decide whether a working outcome enters the working set.
    ///
    /// With the filter disabled every working outcome is admitted.
    /// With it enabled, an outcome is admitted only when its measured
    /// speed falls inside the window; an unmeasured speed cannot be
    /// evaluated and is rejected as filtered, not as an error.
    /// Categorization is independent of this decision.
    pub fn admit(&self, outcome: &CheckOutcome) -> bool {
        if !outcome.working {
            return false;
        }
        if !self.enabled {
            return true;
        }
        match outcome.speed_ms {
            Some(speed) => self.min_speed <= speed && speed <= self.max_speed,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::models::CheckError;

    fn working(speed_ms: u64) -> CheckOutcome {
        CheckOutcome::working("1.2.3.4:8080".to_string(), speed_ms, 0)
    }

    #[test]
    fn test_disabled_admits_all_working() {
        let filter = SpeedFilter::default();
        assert!(filter.admit(&working(0)));
        assert!(filter.admit(&working(99_999)));
    }

    #[test]
    fn test_window_bounds_inclusive() {
        let filter = SpeedFilter {
            enabled: true,
            min_speed: 100,
            max_speed: 500,
        };
        assert!(!filter.admit(&working(99)));
        assert!(filter.admit(&working(100)));
        assert!(filter.admit(&working(500)));
        assert!(!filter.admit(&working(501)));
    }

    #[test]
    fn test_unmeasured_speed_rejected_when_enabled() {
        let filter = SpeedFilter {
            enabled: true,
            min_speed: 0,
            max_speed: 1000,
        };
        let mut outcome = working(100);
        outcome.speed_ms = None;
        assert!(!filter.admit(&outcome));
    }

    #[test]
    fn test_failed_outcome_never_admitted() {
        let filter = SpeedFilter::default();
        let outcome =
            CheckOutcome::failed("1.2.3.4:8080".to_string(), CheckError::Timeout, 0);
        assert!(!filter.admit(&outcome));
    }
}
