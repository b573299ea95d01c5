//! Fund identity, daily observations and date ranges

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

use crate::core::error::FundError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FundKind {
    /// Securities mutual funds
    #[default]
    #[serde(rename = "YAT")]
    Yat,
    /// Pension funds
    #[serde(rename = "EMK")]
    Emk,
    /// Exchange traded funds
    #[serde(rename = "BYF")]
    Byf,
}

impl FundKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FundKind::Yat => "YAT",
            FundKind::Emk => "EMK",
            FundKind::Byf => "BYF",
        }
    }
}

impl Display for FundKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FundKind {
    type Err = FundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "YAT" => Ok(FundKind::Yat),
            "EMK" => Ok(FundKind::Emk),
            "BYF" => Ok(FundKind::Byf),
            other => Err(FundError::InvalidParameter(format!(
                "kind should be one of YAT, EMK or BYF, got '{other}'"
            ))),
        }
    }
}

/// Upper-cases and trims a fund code so lookups are case insensitive.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Registry entry for a fund known to the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fund {
    pub code: String,
    pub kind: FundKind,
    pub title: Option<String>,
    pub latest_date: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}

/// One day of recorded values for a fund.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    pub investor_count: Option<u64>,
}

/// An observation as returned by the upstream provider, still carrying the
/// identity fields the provider sends alongside every row.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoRow {
    pub code: String,
    pub title: Option<String>,
    pub observation: Observation,
}

/// Inclusive calendar-day range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// The range covering `days` days back from `end`.
    /// Saturates at the earliest representable date.
    pub fn ending(end: NaiveDate, days: i64) -> Self {
        let start = Duration::try_days(days.max(0))
            .and_then(|span| end.checked_sub_signed(span))
            .unwrap_or(NaiveDate::MIN);
        Self::new(start, end)
    }

    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// Width of the range, `end - start` in days.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}
