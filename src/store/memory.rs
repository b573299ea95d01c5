use crate::core::cache::FundStore;
use crate::core::fund::{DateRange, Fund, Observation};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Default)]
struct Tables {
    funds: HashMap<String, Fund>,
    historical_data: HashMap<String, BTreeMap<NaiveDate, Observation>>,
}

/// In-memory fund store, lost on restart
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of observations held for `code`.
    pub async fn observation_count(&self, code: &str) -> usize {
        let tables = self.inner.lock().await;
        tables.historical_data.get(code).map_or(0, BTreeMap::len)
    }

    pub async fn fund_count(&self) -> usize {
        self.inner.lock().await.funds.len()
    }
}

#[async_trait]
impl FundStore for MemoryStore {
    async fn load_fund(&self, code: &str) -> Result<Option<Fund>> {
        let tables = self.inner.lock().await;
        let fund = tables.funds.get(code).cloned();
        debug!(code, hit = fund.is_some(), "Memory store fund lookup");
        Ok(fund)
    }

    async fn load_observations(&self, code: &str, range: DateRange) -> Result<Vec<Observation>> {
        let tables = self.inner.lock().await;
        let observations: Vec<Observation> = tables
            .historical_data
            .get(code)
            .map(|rows| rows.range(range.start..=range.end).map(|(_, obs)| obs.clone()).collect())
            .unwrap_or_default();
        debug!(code, count = observations.len(), "Memory store observation read");
        Ok(observations)
    }

    async fn upsert_funds(&self, funds: &[Fund]) -> Result<()> {
        let mut tables = self.inner.lock().await;
        for fund in funds {
            tables.funds.insert(fund.code.clone(), fund.clone());
        }
        debug!(count = funds.len(), "Memory store fund upsert");
        Ok(())
    }

    async fn upsert_observations(&self, code: &str, observations: &[Observation]) -> Result<()> {
        let mut tables = self.inner.lock().await;
        let rows = tables.historical_data.entry(code.to_string()).or_default();
        for obs in observations {
            rows.insert(obs.date, obs.clone());
        }
        debug!(code, count = observations.len(), "Memory store observation upsert");
        Ok(())
    }

    async fn record_sync(&self, fund: &Fund, observations: &[Observation]) -> Result<()> {
        let mut tables = self.inner.lock().await;
        tables.funds.insert(fund.code.clone(), fund.clone());
        let rows = tables.historical_data.entry(fund.code.clone()).or_default();
        for obs in observations {
            rows.insert(obs.date, obs.clone());
        }
        debug!(code = %fund.code, count = observations.len(), "Memory store sync recorded");
        Ok(())
    }
}
