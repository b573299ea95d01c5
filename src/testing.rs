//! Upstream and store doubles shared by unit tests.

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::core::allocation::{AllocationRow, AssetClass};
use crate::core::cache::FundStore;
use crate::core::error::FundError;
use crate::core::fund::{DateRange, Fund, FundKind, InfoRow, Observation};
use crate::core::source::{FundDataSource, SessionToken};

pub fn observation(date: NaiveDate, price: f64) -> Observation {
    Observation {
        date,
        price: Some(price),
        market_cap: Some(price * 1_000.0),
        investor_count: Some(100),
    }
}

/// One row per day for `days` days ending at `last`.
pub fn daily_rows(code: &str, title: &str, last: NaiveDate, days: i64) -> Vec<InfoRow> {
    (0..days)
        .rev()
        .map(|offset| InfoRow {
            code: code.to_string(),
            title: Some(title.to_string()),
            observation: observation(last - Duration::days(offset), 10.0 + offset as f64),
        })
        .collect()
}

/// Serves a fixed table of rows, answering each query with the rows that fall
/// into the requested window.
#[derive(Default)]
pub struct StubSource {
    pub rows: Vec<InfoRow>,
    pub allocation: Vec<AllocationRow>,
    pub fail_bootstrap: bool,
    pub fail_info: bool,
    pub fail_allocation: bool,
    pub info_calls: AtomicUsize,
    pub allocation_calls: AtomicUsize,
}

impl StubSource {
    pub fn with_rows(rows: Vec<InfoRow>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    pub fn with_allocation(mut self, date: NaiveDate) -> Self {
        self.allocation = vec![AllocationRow {
            date,
            weights: vec![(AssetClass::Stock, 60.0), (AssetClass::Repo, 40.0)],
        }];
        self
    }

    pub fn info_calls(&self) -> usize {
        self.info_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FundDataSource for StubSource {
    async fn bootstrap_session(&self) -> Result<SessionToken, FundError> {
        if self.fail_bootstrap {
            return Err(FundError::UpstreamUnavailable("handshake refused".into()));
        }
        Ok(SessionToken("session=stub".into()))
    }

    async fn fetch_info(
        &self,
        range: DateRange,
        code: Option<&str>,
        _kind: FundKind,
        _session: &SessionToken,
    ) -> Result<Vec<InfoRow>, FundError> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_info {
            return Err(FundError::UpstreamUnavailable("info down".into()));
        }
        Ok(self
            .rows
            .iter()
            .filter(|row| range.contains(row.observation.date))
            .filter(|row| code.is_none_or(|code| code == row.code))
            .cloned()
            .collect())
    }

    async fn fetch_allocation(
        &self,
        _range: DateRange,
        _code: &str,
        _kind: FundKind,
        _session: &SessionToken,
    ) -> Result<Vec<AllocationRow>, FundError> {
        self.allocation_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_allocation {
            return Err(FundError::UpstreamUnavailable("allocation down".into()));
        }
        Ok(self.allocation.clone())
    }
}

/// A store that reads as empty and rejects every write.
pub struct FailingStore;

#[async_trait]
impl FundStore for FailingStore {
    async fn load_fund(&self, _code: &str) -> anyhow::Result<Option<Fund>> {
        Ok(None)
    }

    async fn load_observations(
        &self,
        _code: &str,
        _range: DateRange,
    ) -> anyhow::Result<Vec<Observation>> {
        Ok(Vec::new())
    }

    async fn upsert_funds(&self, _funds: &[Fund]) -> anyhow::Result<()> {
        Err(anyhow!("disk full"))
    }

    async fn upsert_observations(
        &self,
        _code: &str,
        _observations: &[Observation],
    ) -> anyhow::Result<()> {
        Err(anyhow!("disk full"))
    }

    async fn record_sync(&self, _fund: &Fund, _observations: &[Observation]) -> anyhow::Result<()> {
        Err(anyhow!("disk full"))
    }
}
