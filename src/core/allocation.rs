use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetClass {
    Stock,
    GovernmentBond,
    PreciousMetals,
    TermDeposit,
    Repo,
    ParticipationAccount,
}

impl AssetClass {
    pub const ALL: [AssetClass; 6] = [
        AssetClass::Stock,
        AssetClass::GovernmentBond,
        AssetClass::PreciousMetals,
        AssetClass::TermDeposit,
        AssetClass::Repo,
        AssetClass::ParticipationAccount,
    ];

    /// Returns the display label for the category
    pub fn label(&self) -> &'static str {
        match self {
            AssetClass::Stock => "Stocks",
            AssetClass::GovernmentBond => "Government Bonds",
            AssetClass::PreciousMetals => "Precious Metals",
            AssetClass::TermDeposit => "Term Deposits",
            AssetClass::Repo => "Repo",
            AssetClass::ParticipationAccount => "Participation Accounts",
        }
    }
}

/// Holdings breakdown reported by the upstream provider for one day.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationRow {
    pub date: NaiveDate,
    pub weights: Vec<(AssetClass, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSlice {
    pub label: String,
    pub value: f64,
}

/// Picks the most recent row and turns it into slices sorted by weight,
/// heaviest first. Zero weight categories are dropped.
pub fn latest_allocation(rows: &[AllocationRow]) -> Vec<AllocationSlice> {
    let Some(latest) = rows.iter().max_by_key(|row| row.date) else {
        return Vec::new();
    };

    let mut slices: Vec<AllocationSlice> = latest
        .weights
        .iter()
        .filter(|(_, weight)| weight.is_finite() && *weight > 0.0)
        .map(|(class, weight)| AllocationSlice {
            label: class.label().to_string(),
            value: *weight,
        })
        .collect();
    slices.sort_by(|a, b| b.value.total_cmp(&a.value));
    slices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(day: u32, weights: Vec<(AssetClass, f64)>) -> AllocationRow {
        AllocationRow {
            date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            weights,
        }
    }

    #[test]
    fn test_latest_allocation_sorted_without_zeroes() {
        let rows = vec![
            row(1, vec![(AssetClass::Stock, 90.0)]),
            row(
                3,
                vec![
                    (AssetClass::Stock, 40.5),
                    (AssetClass::GovernmentBond, 0.0),
                    (AssetClass::Repo, 12.0),
                    (AssetClass::PreciousMetals, 47.5),
                ],
            ),
            row(2, vec![(AssetClass::TermDeposit, 100.0)]),
        ];

        let slices = latest_allocation(&rows);
        let labels: Vec<_> = slices.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Precious Metals", "Stocks", "Repo"]);
        assert_eq!(slices[0].value, 47.5);
    }

    #[test]
    fn test_latest_allocation_empty() {
        assert!(latest_allocation(&[]).is_empty());
    }
}
