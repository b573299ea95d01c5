use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::core::fund::{InfoRow, Observation};

/// Cached and freshly fetched history reconciled into one series.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MergedSeries {
    pub title: Option<String>,
    /// Strictly ascending by date
    pub observations: Vec<Observation>,
}

impl MergedSeries {
    pub fn latest(&self) -> Option<&Observation> {
        self.observations.last()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Overlays `fresh` on top of `cached`, one observation per date.
///
/// A date present in both inputs takes the fresh observation. Input order does
/// not matter; among fresh rows for the same date the last one wins. The
/// cached title is kept when known, otherwise the first fresh row carrying a
/// title provides it.
pub fn merge(cached: &[Observation], cached_title: Option<&str>, fresh: &[InfoRow]) -> MergedSeries {
    let mut by_date: BTreeMap<NaiveDate, Observation> = cached
        .iter()
        .map(|obs| (obs.date, obs.clone()))
        .collect();
    for row in fresh {
        by_date.insert(row.observation.date, row.observation.clone());
    }

    let title = cached_title
        .map(str::to_string)
        .or_else(|| fresh.iter().find_map(|row| row.title.clone()));

    MergedSeries {
        title,
        observations: by_date.into_values().collect(),
    }
}
