//! Risk and return figures computed over a single daily series.
use rust_decimal::{Decimal, prelude::*};
use rust_finprim::rate::cagr as finprim_cagr;
use serde::Serialize;
use tracing::debug;

use crate::core::series::{HistoricalPoint, SeriesKind};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
/// Shortest series the ratio based figures are reported for
const MIN_POINTS: usize = 10;

/// Day over day relative changes, skipping days that follow a non-positive
/// value.
pub fn daily_returns(history: &[HistoricalPoint]) -> Vec<f64> {
    history
        .windows(2)
        .filter(|pair| pair[0].value > 0.0)
        .map(|pair| (pair[1].value - pair[0].value) / pair[0].value)
        .collect()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let avg = mean(values);
    let squared: Vec<f64> = values.iter().map(|v| (v - avg).powi(2)).collect();
    mean(&squared).sqrt()
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Annualized Sharpe ratio with a zero risk-free rate.
pub fn sharpe_ratio(history: &[HistoricalPoint]) -> Option<f64> {
    if history.len() < MIN_POINTS {
        return None;
    }
    let returns = daily_returns(history);
    if returns.is_empty() {
        return None;
    }
    let deviation = std_dev(&returns);
    if deviation == 0.0 || deviation.is_nan() {
        return None;
    }
    finite(mean(&returns) / deviation * TRADING_DAYS_PER_YEAR.sqrt())
}

/// Annualized standard deviation of daily returns.
pub fn volatility(history: &[HistoricalPoint]) -> Option<f64> {
    if history.len() < MIN_POINTS {
        return None;
    }
    let returns = daily_returns(history);
    if returns.is_empty() {
        return None;
    }
    let deviation = std_dev(&returns);
    if deviation == 0.0 || deviation.is_nan() {
        return None;
    }
    finite(deviation * TRADING_DAYS_PER_YEAR.sqrt())
}

/// Largest peak to trough decline as a fraction of the peak.
pub fn max_drawdown(history: &[HistoricalPoint]) -> Option<f64> {
    let first = history.first()?;
    if history.len() < 2 || first.value <= 0.0 {
        return None;
    }
    let mut peak = first.value;
    let mut worst: f64 = 0.0;
    for point in &history[1..] {
        // Missing or bogus prints
        if point.value <= 0.0 {
            continue;
        }
        peak = peak.max(point.value);
        worst = worst.max((peak - point.value) / peak);
    }
    finite(worst)
}

/// Trailing simple moving average. The first point is dated on the day the
/// window fills up.
pub fn moving_average(history: &[HistoricalPoint], window: usize) -> Vec<HistoricalPoint> {
    if window == 0 || history.len() < window {
        return Vec::new();
    }
    history
        .windows(window)
        .map(|slice| HistoricalPoint {
            date: slice[slice.len() - 1].date,
            value: slice.iter().map(|p| p.value).sum::<f64>() / window as f64,
        })
        .collect()
}

/// Compound annual growth between the first and the last point.
pub fn cagr(history: &[HistoricalPoint]) -> Option<f64> {
    let (first, last) = (history.first()?, history.last()?);
    if first.value <= 0.0 || last.value <= 0.0 {
        return None;
    }
    let days = (last.date - first.date).num_days();
    if days < 1 {
        return None;
    }
    let years = days as f64 / 365.0;

    let begin = Decimal::from_f64(first.value)?;
    let end = Decimal::from_f64(last.value)?;
    let n_years = Decimal::from_f64(years)?;
    if n_years.is_zero() {
        return None;
    }
    // `powd` panics when the annualized growth does not fit a Decimal
    let growth = end.checked_div(begin)?;
    growth.checked_powd(Decimal::ONE.checked_div(n_years)?)?;
    let rate = finprim_cagr(begin, end, n_years);
    debug!("cagr: {begin}, {end}, {n_years} = {rate}");
    rate.to_f64()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub code: String,
    pub series: SeriesKind,
    pub sharpe_ratio: Option<f64>,
    pub volatility: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub cagr: Option<f64>,
    pub moving_average: Vec<HistoricalPoint>,
}

impl AnalyticsReport {
    pub fn compute(code: &str, series: SeriesKind, history: &[HistoricalPoint], window: usize) -> Self {
        AnalyticsReport {
            code: code.to_string(),
            series,
            sharpe_ratio: sharpe_ratio(history),
            volatility: volatility(history),
            max_drawdown: max_drawdown(history),
            cagr: cagr(history),
            moving_average: moving_average(history, window),
        }
    }
}
