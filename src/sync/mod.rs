//! Cache-aware history synchronization.
//!
//! A request reads what the store already holds, decides whether that is good
//! enough, pulls the missing history from upstream in chunks, merges both
//! sides and writes the result back before shaping the overview.

pub mod chunking;
pub mod freshness;
pub mod merge;
pub mod persist;

use chrono::{NaiveDate, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::core::allocation::AllocationRow;
use crate::core::cache::FundStore;
use crate::core::config::{AppConfig, RequestDefaults};
use crate::core::error::FundError;
use crate::core::fund::{DateRange, Fund, FundKind, Observation, normalize_code};
use crate::core::source::{FundDataSource, SessionToken};
use crate::overview::FundOverview;
use chunking::{ChunkPlan, fetch_chunked};
use freshness::FreshnessPolicy;
use merge::merge;
use persist::persist_best_effort;

#[derive(Debug, Clone, PartialEq)]
pub struct OverviewRequest {
    pub code: String,
    pub kind: FundKind,
    /// Calendar days of history ending today
    pub days: i64,
}

pub struct FundHistoryService {
    source: Arc<dyn FundDataSource>,
    store: Option<Arc<dyn FundStore>>,
    policy: FreshnessPolicy,
    plan: ChunkPlan,
    /// Longest history a single request may ask for
    max_days: i64,
}

impl FundHistoryService {
    /// Without a store every request goes to upstream.
    pub fn new(source: Arc<dyn FundDataSource>, store: Option<Arc<dyn FundStore>>) -> Self {
        Self {
            source,
            store,
            policy: FreshnessPolicy::default(),
            plan: ChunkPlan::default(),
            max_days: RequestDefaults::default().max_days,
        }
    }

    pub fn from_config(
        source: Arc<dyn FundDataSource>,
        store: Option<Arc<dyn FundStore>>,
        config: &AppConfig,
    ) -> Self {
        Self::new(source, store)
            .with_policy(FreshnessPolicy::new(config.freshness))
            .with_plan(ChunkPlan {
                max_days: config.upstream.chunk_days,
                retries: config.upstream.retries,
                retry_delay_ms: config.upstream.retry_delay_ms,
            })
            .with_max_days(config.defaults.max_days)
    }

    pub fn with_policy(mut self, policy: FreshnessPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_plan(mut self, plan: ChunkPlan) -> Self {
        self.plan = plan;
        self
    }

    pub fn with_max_days(mut self, max_days: i64) -> Self {
        self.max_days = max_days;
        self
    }

    pub fn caching_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub async fn overview(&self, request: &OverviewRequest) -> Result<FundOverview, FundError> {
        self.overview_as_of(request, Utc::now().date_naive()).await
    }

    #[instrument(skip_all, fields(code = %request.code, kind = %request.kind, days = request.days))]
    pub async fn overview_as_of(
        &self,
        request: &OverviewRequest,
        today: NaiveDate,
    ) -> Result<FundOverview, FundError> {
        let code = normalize_code(&request.code);
        if code.is_empty() {
            return Err(FundError::MissingParameter("code"));
        }
        check_days(request.days, self.max_days)?;
        let kind = request.kind;
        let range = DateRange::ending(today, request.days);

        let (cached_fund, cached) = self.load_cached(&code, range).await;
        let report = self.policy.evaluate(&cached, range, request.days, today);
        if report.is_valid() {
            debug!(rows = cached.len(), "Cache hit");
        } else {
            debug!(rows = cached.len(), ?report, "Cache miss");
        }
        let cached_title = cached_fund.and_then(|fund| fund.title);

        let session = match self.source.bootstrap_session().await {
            Ok(session) => session,
            Err(e) if !cached.is_empty() => {
                warn!(error = %e, "Upstream unreachable, serving cached history");
                let series = merge(&cached, cached_title.as_deref(), &[]);
                return FundOverview::assemble(&code, kind, &series, &[]);
            }
            Err(e) => return Err(e),
        };

        let info = async {
            if report.is_valid() {
                return Vec::new();
            }
            fetch_chunked(self.source.as_ref(), &session, &code, kind, range, self.plan)
                .await
                .rows
        };
        let allocation = self.fetch_allocation(&session, &code, kind, range);
        let (fresh, allocation) = futures::join!(info, allocation);

        let series = merge(&cached, cached_title.as_deref(), &fresh);
        if !fresh.is_empty() {
            if let Some(store) = &self.store {
                persist_best_effort(store.as_ref(), &code, kind, &series).await;
            }
        }
        debug!(
            cached = cached.len(),
            fetched = fresh.len(),
            merged = series.observations.len(),
            "Reconciled history"
        );

        FundOverview::assemble(&code, kind, &series, &allocation)
    }

    /// Lists every fund of `kind` reporting today and records them in the
    /// registry.
    pub async fn discover(&self, kind: FundKind) -> Result<Vec<Fund>, FundError> {
        self.discover_as_of(kind, Utc::now().date_naive()).await
    }

    #[instrument(skip(self))]
    pub async fn discover_as_of(
        &self,
        kind: FundKind,
        today: NaiveDate,
    ) -> Result<Vec<Fund>, FundError> {
        let session = self.source.bootstrap_session().await?;
        let rows = self
            .source
            .fetch_info(DateRange::single(today), None, kind, &session)
            .await?;

        let updated_at = Utc::now();
        let mut seen = HashSet::new();
        let funds: Vec<Fund> = rows
            .into_iter()
            .filter_map(|row| {
                let code = normalize_code(&row.code);
                if code.is_empty() || !seen.insert(code.clone()) {
                    return None;
                }
                Some(Fund {
                    code,
                    kind,
                    title: row.title,
                    latest_date: Some(row.observation.date),
                    updated_at,
                })
            })
            .collect();

        if let Some(store) = &self.store {
            if !funds.is_empty() {
                match store.upsert_funds(&funds).await {
                    Ok(()) => info!("Synced {} funds for kind {}", funds.len(), kind),
                    Err(e) => warn!(error = %e, "Failed to record discovered funds"),
                }
            }
        }
        Ok(funds)
    }

    /// Cached fund and observations, treating an unreadable store as empty.
    async fn load_cached(&self, code: &str, range: DateRange) -> (Option<Fund>, Vec<Observation>) {
        let Some(store) = &self.store else {
            return (None, Vec::new());
        };
        let fund = store.load_fund(code).await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read fund from cache");
            None
        });
        let observations = store
            .load_observations(code, range)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to read history from cache");
                Vec::new()
            });
        (fund, observations)
    }

    /// Allocation is fetched on every request and never cached. A failure only
    /// empties the breakdown.
    async fn fetch_allocation(
        &self,
        session: &SessionToken,
        code: &str,
        kind: FundKind,
        range: DateRange,
    ) -> Vec<AllocationRow> {
        match self
            .source
            .fetch_allocation(range, code, kind, session)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "Allocation fetch failed, continuing without it");
                Vec::new()
            }
        }
    }
}

/// `days` must lie in `1..=max_days`.
pub fn check_days(days: i64, max_days: i64) -> Result<i64, FundError> {
    if days <= 0 || days > max_days {
        return Err(FundError::InvalidParameter(format!(
            "days should be between 1 and {max_days}, got {days}"
        )));
    }
    Ok(days)
}
