use axum::{
    Json,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::AppState;
use super::error::ApiError;
use crate::analytics::AnalyticsReport;
use crate::core::error::FundError;
use crate::core::fund::{Fund, FundKind, normalize_code};
use crate::core::series::SeriesKind;
use crate::sync::{OverviewRequest, check_days};

pub const FUNDS_CACHE_CONTROL: &str = "public, s-maxage=3600, stale-while-revalidate=86400";
pub const HISTORY_CACHE_CONTROL: &str = "public, s-maxage=900, stale-while-revalidate=3600";
const DEFAULT_WINDOW: usize = 20;

#[derive(Debug, Default, Deserialize)]
pub struct FundsQuery {
    pub kind: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub code: Option<String>,
    pub kind: Option<String>,
    pub days: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    #[serde(flatten)]
    pub history: HistoryQuery,
    pub series: Option<String>,
    pub window: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FundSummary {
    code: String,
    title: Option<String>,
    kind: FundKind,
    latest_date: Option<NaiveDate>,
}

impl From<Fund> for FundSummary {
    fn from(fund: Fund) -> Self {
        FundSummary {
            code: fund.code,
            title: fund.title,
            kind: fund.kind,
            latest_date: fund.latest_date,
        }
    }
}

/// Blank query values count as absent.
fn present(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_kind(raw: &Option<String>, default: FundKind) -> Result<FundKind, FundError> {
    present(raw).map_or(Ok(default), str::parse)
}

fn parse_days(raw: &Option<String>, default: i64, max: i64) -> Result<i64, FundError> {
    let Some(raw) = present(raw) else {
        return Ok(default);
    };
    let days = raw.parse::<i64>().map_err(|_| {
        FundError::InvalidParameter(format!("days should be a positive number, got '{raw}'"))
    })?;
    check_days(days, max)
}

fn parse_window(raw: &Option<String>) -> Result<usize, FundError> {
    present(raw).map_or(Ok(DEFAULT_WINDOW), |raw| {
        raw.parse().map_err(|_| {
            FundError::InvalidParameter(format!("window should be a whole number, got '{raw}'"))
        })
    })
}

impl HistoryQuery {
    fn to_request(&self, state: &AppState) -> Result<OverviewRequest, FundError> {
        let code = present(&self.code)
            .map(normalize_code)
            .ok_or(FundError::MissingParameter("code"))?;
        Ok(OverviewRequest {
            code,
            kind: parse_kind(&self.kind, state.defaults.kind)?,
            days: parse_days(&self.days, state.defaults.days, state.defaults.max_days)?,
        })
    }
}

/// GET /api/funds
pub async fn list_funds(
    State(state): State<AppState>,
    Query(query): Query<FundsQuery>,
) -> Result<Response, ApiError> {
    let failed = |e| ApiError::new("Failed to load funds", e);
    let kind = parse_kind(&query.kind, state.defaults.kind).map_err(failed)?;
    let today = Utc::now().date_naive();
    let funds = state
        .service
        .discover_as_of(kind, today)
        .await
        .map_err(failed)?;
    let funds: Vec<FundSummary> = funds.into_iter().map(FundSummary::from).collect();

    Ok((
        [(header::CACHE_CONTROL, FUNDS_CACHE_CONTROL)],
        Json(json!({ "funds": funds, "asOf": today })),
    )
        .into_response())
}

/// GET /api/fund-history
pub async fn fund_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Response, ApiError> {
    let failed = |e| ApiError::new("Failed to load fund", e);
    let request = query.to_request(&state).map_err(failed)?;
    let overview = state.service.overview(&request).await.map_err(failed)?;

    Ok((
        [(header::CACHE_CONTROL, HISTORY_CACHE_CONTROL)],
        Json(json!({ "fund": overview })),
    )
        .into_response())
}

/// GET /api/fund-analytics
pub async fn fund_analytics(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Response, ApiError> {
    let failed = |e| ApiError::new("Failed to compute analytics", e);
    let request = query.history.to_request(&state).map_err(failed)?;
    let series = present(&query.series)
        .map_or(Ok(SeriesKind::default()), str::parse)
        .map_err(failed)?;
    let window = parse_window(&query.window).map_err(failed)?;

    let overview = state.service.overview(&request).await.map_err(failed)?;
    let report = AnalyticsReport::compute(&overview.code, series, overview.series(series), window);

    Ok(([(header::CACHE_CONTROL, HISTORY_CACHE_CONTROL)], Json(report)).into_response())
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "caching": state.service.caching_enabled(),
    }))
}
