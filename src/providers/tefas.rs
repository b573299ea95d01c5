use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, instrument};

use super::util::{snippet, unavailable};
use crate::core::allocation::{AllocationRow, AssetClass};
use crate::core::error::FundError;
use crate::core::fund::{DateRange, FundKind, InfoRow, Observation, normalize_code};
use crate::core::source::{FundDataSource, SessionToken};

pub const INFO_ENDPOINT: &str = "/api/DB/BindHistoryInfo";
pub const ALLOCATION_ENDPOINT: &str = "/api/DB/BindHistoryAllocation";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";
const SNIPPET_CHARS: usize = 200;

/// Day.month.year, the only format the provider accepts.
pub fn format_upstream_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// Client for the TEFAS historical data endpoints.
pub struct TefasProvider {
    base_url: String,
    client: reqwest::Client,
}

impl TefasProvider {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(default_headers(&base_url)?)
            .timeout(timeout)
            .build()
            .context("Failed to build upstream HTTP client")?;

        Ok(Self { base_url, client })
    }

    async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        form: &[(&str, String)],
        session: &SessionToken,
    ) -> Result<Vec<T>, FundError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("Posting to {}", url);

        let mut request = self.client.post(&url).form(form);
        if !session.as_str().is_empty() {
            request = request.header(header::COOKIE, session.as_str());
        }
        let response = request
            .send()
            .await
            .map_err(|e| unavailable("TEFAS request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FundError::UpstreamUnavailable(format!(
                "TEFAS request failed: {status}"
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| unavailable("Failed to read TEFAS response", e))?;

        match serde_json::from_str::<Envelope<T>>(&text) {
            Ok(envelope) => Ok(envelope.data.unwrap_or_default()),
            Err(e) => {
                let snippet = snippet(&text, SNIPPET_CHARS);
                error!(error = ?e, response = %snippet, "Invalid TEFAS response");
                Err(FundError::UpstreamBadResponse { snippet })
            }
        }
    }

    fn form(range: DateRange, code: &str, kind: FundKind) -> [(&'static str, String); 4] {
        [
            ("fontip", kind.as_str().to_string()),
            ("bastarih", format_upstream_date(range.start)),
            ("bittarih", format_upstream_date(range.end)),
            ("fonkod", normalize_code(code)),
        ]
    }
}

fn default_headers(base_url: &str) -> anyhow::Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
    );
    headers.insert(
        header::ORIGIN,
        HeaderValue::from_str(base_url).context("Invalid upstream base URL")?,
    );
    headers.insert(
        header::REFERER,
        HeaderValue::from_str(&format!("{base_url}/TarihselVeriler.aspx"))
            .context("Invalid upstream base URL")?,
    );
    Ok(headers)
}

/// Joins the `name=value` part of every `Set-Cookie` header.
fn session_from_headers(headers: &HeaderMap) -> SessionToken {
    let cookies: Vec<&str> = headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|cookie| cookie.split(';').next())
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .collect();
    SessionToken(cookies.join("; "))
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<Vec<T>>,
}

/// The provider sends numbers both bare and quoted.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Numeric::Number(n) => Some(*n),
            Numeric::Text(s) => s.trim().replace(',', ".").parse().ok(),
        };
        value.filter(|n: &f64| n.is_finite())
    }
}

/// `TARIH` is an epoch timestamp in milliseconds.
fn parse_timestamp(value: &Option<Numeric>) -> Option<NaiveDate> {
    let millis = value.as_ref()?.as_f64()? as i64;
    DateTime::from_timestamp_millis(millis).map(|dt| dt.date_naive())
}

fn non_negative(value: &Option<Numeric>) -> Option<f64> {
    value.as_ref().and_then(Numeric::as_f64).filter(|n| *n >= 0.0)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct TefasInfoRow {
    #[serde(default)]
    tarih: Option<Numeric>,
    #[serde(default)]
    fonkodu: Option<String>,
    #[serde(default)]
    fonunvan: Option<String>,
    #[serde(default)]
    fiyat: Option<Numeric>,
    #[serde(default)]
    portfoybuyukluk: Option<Numeric>,
    #[serde(default)]
    kisisayisi: Option<Numeric>,
}

impl TefasInfoRow {
    fn into_info_row(self) -> Option<InfoRow> {
        let date = parse_timestamp(&self.tarih)?;
        let code = self.fonkodu.as_deref().map(normalize_code)?;
        if code.is_empty() {
            return None;
        }
        Some(InfoRow {
            code,
            title: self.fonunvan.filter(|t| !t.trim().is_empty()),
            observation: Observation {
                date,
                price: non_negative(&self.fiyat),
                market_cap: non_negative(&self.portfoybuyukluk),
                investor_count: non_negative(&self.kisisayisi).map(|n| n.round() as u64),
            },
        })
    }
}

#[derive(Debug, Deserialize)]
struct TefasAllocationRow {
    #[serde(rename = "TARIH", default)]
    tarih: Option<Numeric>,
    #[serde(rename = "HS", default)]
    stock: Option<Numeric>,
    #[serde(rename = "DT", default)]
    government_bond: Option<Numeric>,
    #[serde(rename = "KM", default)]
    precious_metals: Option<Numeric>,
    #[serde(rename = "VM", default)]
    term_deposit: Option<Numeric>,
    #[serde(rename = "R", default)]
    repo: Option<Numeric>,
    #[serde(rename = "KH", default)]
    participation_account: Option<Numeric>,
}

impl TefasAllocationRow {
    fn into_allocation_row(self) -> Option<AllocationRow> {
        let date = parse_timestamp(&self.tarih)?;
        let weights = AssetClass::ALL
            .iter()
            .map(|class| {
                let value = match class {
                    AssetClass::Stock => &self.stock,
                    AssetClass::GovernmentBond => &self.government_bond,
                    AssetClass::PreciousMetals => &self.precious_metals,
                    AssetClass::TermDeposit => &self.term_deposit,
                    AssetClass::Repo => &self.repo,
                    AssetClass::ParticipationAccount => &self.participation_account,
                };
                (*class, value.as_ref().and_then(Numeric::as_f64).unwrap_or(0.0))
            })
            .collect();
        Some(AllocationRow { date, weights })
    }
}

#[async_trait]
impl FundDataSource for TefasProvider {
    #[instrument(name = "TefasHandshake", skip_all)]
    async fn bootstrap_session(&self) -> Result<SessionToken, FundError> {
        let response = self
            .client
            .get(&self.base_url)
            .send()
            .await
            .map_err(|e| unavailable("Failed to prime TEFAS session", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FundError::UpstreamUnavailable(format!(
                "Failed to prime TEFAS session: {status}"
            )));
        }

        let session = session_from_headers(response.headers());
        debug!(cookies = session.as_str().split("; ").count(), "TEFAS session primed");
        Ok(session)
    }

    #[instrument(
        name = "TefasInfo",
        skip_all,
        fields(code = ?code, kind = %kind, range = %range)
    )]
    async fn fetch_info(
        &self,
        range: DateRange,
        code: Option<&str>,
        kind: FundKind,
        session: &SessionToken,
    ) -> Result<Vec<InfoRow>, FundError> {
        let form = Self::form(range, code.unwrap_or_default(), kind);
        let rows: Vec<TefasInfoRow> = self.post(INFO_ENDPOINT, &form, session).await?;
        let total = rows.len();
        let rows: Vec<InfoRow> = rows
            .into_iter()
            .filter_map(TefasInfoRow::into_info_row)
            .collect();
        if rows.len() < total {
            debug!("Dropped {} info rows without date or code", total - rows.len());
        }
        Ok(rows)
    }

    #[instrument(
        name = "TefasAllocation",
        skip_all,
        fields(code = %code, kind = %kind, range = %range)
    )]
    async fn fetch_allocation(
        &self,
        range: DateRange,
        code: &str,
        kind: FundKind,
        session: &SessionToken,
    ) -> Result<Vec<AllocationRow>, FundError> {
        let form = Self::form(range, code, kind);
        let rows: Vec<TefasAllocationRow> = self.post(ALLOCATION_ENDPOINT, &form, session).await?;
        Ok(rows
            .into_iter()
            .filter_map(TefasAllocationRow::into_allocation_row)
            .collect())
    }
}
