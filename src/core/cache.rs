use anyhow::Result;
use async_trait::async_trait;

use crate::core::fund::{DateRange, Fund, Observation};

/// Persistent cache for fund metadata and daily observations.
///
/// Writes are upserts: funds are keyed by code and observations by
/// (code, date), so replaying a write leaves the store unchanged.
#[async_trait]
pub trait FundStore: Send + Sync {
    async fn load_fund(&self, code: &str) -> Result<Option<Fund>>;

    /// Observations for `code` inside `range`, ascending by date.
    async fn load_observations(&self, code: &str, range: DateRange) -> Result<Vec<Observation>>;

    async fn upsert_funds(&self, funds: &[Fund]) -> Result<()>;

    async fn upsert_observations(&self, code: &str, observations: &[Observation]) -> Result<()>;

    /// Writes the outcome of one sync: the fund record and its observations
    /// land together or not at all.
    async fn record_sync(&self, fund: &Fund, observations: &[Observation]) -> Result<()>;
}
