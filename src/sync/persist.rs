use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use crate::core::cache::FundStore;
use crate::core::fund::{Fund, FundKind};
use crate::sync::merge::MergedSeries;

/// Registry entry describing `series` as of now.
pub fn fund_record(code: &str, kind: FundKind, series: &MergedSeries) -> Fund {
    Fund {
        code: code.to_string(),
        kind,
        title: series.title.clone(),
        latest_date: series.latest().map(|obs| obs.date),
        updated_at: Utc::now(),
    }
}

/// Writes the fund record and every merged observation back to the store in
/// one commit.
pub async fn persist(
    store: &dyn FundStore,
    code: &str,
    kind: FundKind,
    series: &MergedSeries,
) -> Result<()> {
    store
        .record_sync(&fund_record(code, kind, series), &series.observations)
        .await?;
    info!(
        code,
        observations = series.observations.len(),
        "Synced fund history to cache"
    );
    Ok(())
}

/// Like [`persist`], but a failing store only costs durability: the error is
/// logged and the caller carries on with the in-memory series.
pub async fn persist_best_effort(
    store: &dyn FundStore,
    code: &str,
    kind: FundKind,
    series: &MergedSeries,
) -> bool {
    match persist(store, code, kind, series).await {
        Ok(()) => true,
        Err(e) => {
            warn!(code, error = %e, "Failed to persist fund history, serving uncached result");
            false
        }
    }
}
