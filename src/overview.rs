//! The record handed to consumers of a fund's history.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::allocation::{AllocationRow, AllocationSlice, latest_allocation};
use crate::core::error::FundError;
use crate::core::fund::FundKind;
use crate::core::series::{HistoricalPoint, SeriesKind};
use crate::sync::merge::MergedSeries;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundOverview {
    pub code: String,
    pub title: Option<String>,
    pub kind: FundKind,
    pub price_history: Vec<HistoricalPoint>,
    pub market_cap_history: Vec<HistoricalPoint>,
    pub investor_history: Vec<HistoricalPoint>,
    pub allocation: Vec<AllocationSlice>,
    pub latest_price: f64,
    pub latest_date: NaiveDate,
}

impl FundOverview {
    pub fn assemble(
        code: &str,
        kind: FundKind,
        series: &MergedSeries,
        allocation: &[AllocationRow],
    ) -> Result<Self, FundError> {
        let latest = series
            .latest()
            .ok_or_else(|| FundError::FundNotFound(code.to_string()))?;

        Ok(FundOverview {
            code: code.to_string(),
            title: series.title.clone(),
            kind,
            price_history: SeriesKind::Price.build(&series.observations),
            market_cap_history: SeriesKind::MarketCap.build(&series.observations),
            investor_history: SeriesKind::Investors.build(&series.observations),
            allocation: latest_allocation(allocation),
            latest_price: latest.price.unwrap_or_default(),
            latest_date: latest.date,
        })
    }

    pub fn series(&self, kind: SeriesKind) -> &[HistoricalPoint] {
        match kind {
            SeriesKind::Price => &self.price_history,
            SeriesKind::MarketCap => &self.market_cap_history,
            SeriesKind::Investors => &self.investor_history,
        }
    }
}
