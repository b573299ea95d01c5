//! Splits wide date ranges into upstream-safe windows and fetches them one
//! after the other.

use chrono::Duration;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::core::error::FundError;
use crate::core::fund::{DateRange, FundKind, InfoRow};
use crate::core::source::{FundDataSource, SessionToken};
use crate::providers::util::with_retry;

/// Partitions `range` into windows no wider than `max_days`, in chronological
/// order. Windows are cut backwards from the end, so only the earliest one can
/// be narrower.
pub fn plan_windows(range: DateRange, max_days: i64) -> Vec<DateRange> {
    let max_days = max_days.max(0);
    let mut windows = Vec::new();
    let mut window_end = range.end;
    loop {
        let window_start = (window_end - Duration::days(max_days)).max(range.start);
        windows.push(DateRange::new(window_start, window_end));
        if window_start <= range.start {
            break;
        }
        window_end = window_start - Duration::days(1);
    }
    windows.reverse();
    windows
}

#[derive(Debug)]
pub struct ChunkFailure {
    pub window: DateRange,
    pub error: FundError,
}

/// Outcome of a chunked fetch. Failed windows are kept next to the rows that
/// did arrive; a partial result is still a usable result.
#[derive(Debug, Default)]
pub struct ChunkedFetch {
    pub rows: Vec<InfoRow>,
    pub succeeded: usize,
    pub failures: Vec<ChunkFailure>,
}

impl ChunkedFetch {
    pub fn windows(&self) -> usize {
        self.succeeded + self.failures.len()
    }

    pub fn is_total_failure(&self) -> bool {
        self.succeeded == 0 && !self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChunkPlan {
    pub max_days: i64,
    pub retries: usize,
    pub retry_delay_ms: u64,
}

impl Default for ChunkPlan {
    fn default() -> Self {
        Self {
            max_days: 90,
            retries: 2,
            retry_delay_ms: 500,
        }
    }
}

pub async fn fetch_chunked(
    source: &dyn FundDataSource,
    session: &SessionToken,
    code: &str,
    kind: FundKind,
    range: DateRange,
    plan: ChunkPlan,
) -> ChunkedFetch {
    let windows = plan_windows(range, plan.max_days);
    debug!(code, windows = windows.len(), %range, "Fetching history in chunks");

    let fetch = stream::iter(windows)
        .fold(ChunkedFetch::default(), |mut acc, window| async move {
            let result = with_retry(
                || source.fetch_info(window, Some(code), kind, session),
                plan.retries,
                plan.retry_delay_ms,
            )
            .await;
            match result {
                Ok(rows) => {
                    debug!(code, %window, rows = rows.len(), "Chunk fetched");
                    acc.succeeded += 1;
                    acc.rows.extend(rows);
                }
                Err(error) => {
                    warn!(code, %window, error = %error, "Chunk fetch failed, continuing");
                    acc.failures.push(ChunkFailure { window, error });
                }
            }
            acc
        })
        .await;

    if !fetch.failures.is_empty() {
        warn!(
            code,
            failed = fetch.failures.len(),
            total = fetch.windows(),
            "History fetched partially"
        );
    }
    fetch
}
