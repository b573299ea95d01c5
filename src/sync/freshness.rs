//! Decides whether cached history can answer a request without upstream.
//!
//! The policy is a heuristic. The provider publishes on trading days only and
//! with some lag, so each predicate carries a tolerance instead of demanding
//! an exact calendar match.

use chrono::{Duration, NaiveDate};
use tracing::debug;

use crate::core::config::FreshnessConfig;
use crate::core::fund::{DateRange, Observation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessReport {
    pub has_enough_data: bool,
    pub covers_full_range: bool,
    pub is_fresh: bool,
}

impl FreshnessReport {
    /// The cache is served as is only when every predicate holds.
    pub fn is_valid(&self) -> bool {
        self.has_enough_data && self.covers_full_range && self.is_fresh
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreshnessPolicy {
    config: FreshnessConfig,
}

impl FreshnessPolicy {
    pub fn new(config: FreshnessConfig) -> Self {
        Self { config }
    }

    /// Trading days expected in a span of `requested_days` calendar days.
    pub fn expected_trading_days(&self, requested_days: i64) -> i64 {
        (requested_days.max(0) as f64 * self.config.trading_day_ratio * self.config.holiday_factor)
            .floor() as i64
    }

    pub fn evaluate(
        &self,
        cached: &[Observation],
        range: DateRange,
        requested_days: i64,
        today: NaiveDate,
    ) -> FreshnessReport {
        let expected = self.expected_trading_days(requested_days);
        let earliest = cached.iter().map(|obs| obs.date).min();
        let latest = cached.iter().map(|obs| obs.date).max();

        let has_enough_data = !cached.is_empty()
            && cached.len() as f64 >= self.config.coverage_ratio * expected as f64;
        let covers_full_range = earliest.is_some_and(|first| {
            first <= range.start + Duration::days(self.config.range_tolerance_days)
        });
        let is_fresh = latest
            .is_some_and(|last| last + Duration::days(self.config.max_age_days) >= today);

        let report = FreshnessReport {
            has_enough_data,
            covers_full_range,
            is_fresh,
        };
        debug!(
            cached = cached.len(),
            expected,
            ?earliest,
            ?latest,
            ?report,
            "Evaluated cache freshness"
        );
        report
    }
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self::new(FreshnessConfig::default())
    }
}
