use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

use crate::core::error::FundError;
use crate::core::fund::Observation;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Selects one of the three daily series a fund reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SeriesKind {
    #[default]
    Price,
    MarketCap,
    Investors,
}

impl SeriesKind {
    pub fn value_of(&self, observation: &Observation) -> Option<f64> {
        match self {
            SeriesKind::Price => observation.price,
            SeriesKind::MarketCap => observation.market_cap,
            SeriesKind::Investors => observation.investor_count.map(|count| count as f64),
        }
    }

    /// Ascending series of the selected field, skipping days without a value.
    pub fn build(&self, observations: &[Observation]) -> Vec<HistoricalPoint> {
        let mut points: Vec<HistoricalPoint> = observations
            .iter()
            .filter_map(|obs| {
                self.value_of(obs).map(|value| HistoricalPoint {
                    date: obs.date,
                    value,
                })
            })
            .collect();
        points.sort_by_key(|p| p.date);
        points
    }
}

impl Display for SeriesKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SeriesKind::Price => "price",
                SeriesKind::MarketCap => "marketCap",
                SeriesKind::Investors => "investors",
            }
        )
    }
}

impl FromStr for SeriesKind {
    type Err = FundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "price" => Ok(SeriesKind::Price),
            "marketcap" | "market_cap" => Ok(SeriesKind::MarketCap),
            "investors" | "investor_count" => Ok(SeriesKind::Investors),
            other => Err(FundError::InvalidParameter(format!(
                "series should be one of price, marketCap or investors, got '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(day: u32, price: Option<f64>, investors: Option<u64>) -> Observation {
        Observation {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            price,
            market_cap: Some(1000.0 * day as f64),
            investor_count: investors,
        }
    }

    #[test]
    fn test_build_filters_missing_and_sorts() {
        let rows = vec![
            obs(3, Some(1.3), Some(30)),
            obs(1, Some(1.1), None),
            obs(2, None, Some(20)),
        ];

        let prices = SeriesKind::Price.build(&rows);
        assert_eq!(prices.len(), 2);
        assert_eq!(prices[0].value, 1.1);
        assert_eq!(prices[1].value, 1.3);

        let investors = SeriesKind::Investors.build(&rows);
        assert_eq!(investors.len(), 2);
        assert_eq!(investors[0].value, 20.0);

        assert_eq!(SeriesKind::MarketCap.build(&rows).len(), 3);
    }

    #[test]
    fn test_series_kind_parsing() {
        assert_eq!("marketCap".parse::<SeriesKind>().unwrap(), SeriesKind::MarketCap);
        assert_eq!("PRICE".parse::<SeriesKind>().unwrap(), SeriesKind::Price);
        assert_eq!("investors".parse::<SeriesKind>().unwrap(), SeriesKind::Investors);
        assert!("volume".parse::<SeriesKind>().is_err());
        assert_eq!(SeriesKind::MarketCap.to_string(), "marketCap");
    }
}
