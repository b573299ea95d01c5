use crate::core::cache::FundStore;
use crate::core::fund::{DateRange, Fund, Observation};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::debug;

const FUNDS_PARTITION: &str = "funds";
const HISTORICAL_PARTITION: &str = "historical_data";

/// Composite (code, date) key. Dates are written as `YYYY-MM-DD` so byte
/// order matches calendar order within one fund.
fn observation_key(code: &str, date: NaiveDate) -> Vec<u8> {
    let mut key = Vec::with_capacity(code.len() + 11);
    key.extend_from_slice(code.as_bytes());
    key.push(0);
    key.extend_from_slice(date.format("%Y-%m-%d").to_string().as_bytes());
    key
}

/// Fund store persisted in a fjall keyspace.
pub struct DiskStore {
    keyspace: Keyspace,
    funds: PartitionHandle,
    historical_data: PartitionHandle,
}

impl DiskStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create cache directory: {}", path.display()))?;

        let keyspace = Config::new(path)
            .open()
            .with_context(|| format!("Failed to open cache keyspace at {}", path.display()))?;
        let funds = keyspace.open_partition(FUNDS_PARTITION, PartitionCreateOptions::default())?;
        let historical_data =
            keyspace.open_partition(HISTORICAL_PARTITION, PartitionCreateOptions::default())?;

        Ok(Self {
            keyspace,
            funds,
            historical_data,
        })
    }
}

#[async_trait]
impl FundStore for DiskStore {
    async fn load_fund(&self, code: &str) -> Result<Option<Fund>> {
        match self.funds.get(code.as_bytes())? {
            Some(value) => {
                debug!("Cache HIT for fund: {}", code);
                Ok(Some(serde_json::from_slice(&value)?))
            }
            None => {
                debug!("Cache MISS for fund: {}", code);
                Ok(None)
            }
        }
    }

    async fn load_observations(&self, code: &str, range: DateRange) -> Result<Vec<Observation>> {
        let start = observation_key(code, range.start);
        let end = observation_key(code, range.end);

        let mut observations = Vec::new();
        for item in self.historical_data.range(start..=end) {
            let (_, value) = item?;
            observations.push(serde_json::from_slice::<Observation>(&value)?);
        }
        debug!(
            "Read {} cached observations for {} in {}",
            observations.len(),
            code,
            range
        );
        Ok(observations)
    }

    async fn upsert_funds(&self, funds: &[Fund]) -> Result<()> {
        let mut batch = self.keyspace.batch();
        for fund in funds {
            batch.insert(
                &self.funds,
                fund.code.as_bytes().to_vec(),
                serde_json::to_vec(fund)?,
            );
        }
        batch.commit().context("Failed to write funds")?;
        self.keyspace.persist(PersistMode::Buffer)?;
        debug!("Upserted {} funds", funds.len());
        Ok(())
    }

    async fn upsert_observations(&self, code: &str, observations: &[Observation]) -> Result<()> {
        let mut batch = self.keyspace.batch();
        for obs in observations {
            batch.insert(
                &self.historical_data,
                observation_key(code, obs.date),
                serde_json::to_vec(obs)?,
            );
        }
        batch
            .commit()
            .with_context(|| format!("Failed to write observations for {code}"))?;
        self.keyspace.persist(PersistMode::Buffer)?;
        debug!("Upserted {} observations for {}", observations.len(), code);
        Ok(())
    }

    async fn record_sync(&self, fund: &Fund, observations: &[Observation]) -> Result<()> {
        let mut batch = self.keyspace.batch();
        batch.insert(
            &self.funds,
            fund.code.as_bytes().to_vec(),
            serde_json::to_vec(fund)?,
        );
        for obs in observations {
            batch.insert(
                &self.historical_data,
                observation_key(&fund.code, obs.date),
                serde_json::to_vec(obs)?,
            );
        }
        batch
            .commit()
            .with_context(|| format!("Failed to record sync for {}", fund.code))?;
        self.keyspace.persist(PersistMode::Buffer)?;
        debug!(
            "Recorded fund {} with {} observations",
            fund.code,
            observations.len()
        );
        Ok(())
    }
}
