use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{NaiveDate, Utc};
use fundview::api::{AppState, router};
use fundview::core::cache::FundStore;
use fundview::core::config::RequestDefaults;
use fundview::core::fund::{Fund, FundKind, Observation};
use fundview::core::series::SeriesKind;
use fundview::providers::TefasProvider;
use fundview::providers::tefas::{ALLOCATION_ENDPOINT, INFO_ENDPOINT};
use fundview::store::memory::MemoryStore;
use fundview::sync::chunking::ChunkPlan;
use fundview::sync::{FundHistoryService, OverviewRequest};
use tower::ServiceExt;
use tracing::info;

mod test_utils {
    use chrono::{Duration, NaiveDate};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub fn epoch_ms(date: NaiveDate) -> i64 {
        date.and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp_millis())
            .unwrap_or_default()
    }

    /// TEFAS info rows, one per day, for `days` days ending at `last`.
    pub fn info_body(code: &str, last: NaiveDate, days: i64) -> String {
        let rows: Vec<_> = (0..days)
            .map(|offset| {
                let date = last - Duration::days(offset);
                json!({
                    "TARIH": epoch_ms(date).to_string(),
                    "FONKODU": code,
                    "FONUNVAN": format!("{code} Fund"),
                    "FIYAT": 2.0 + offset as f64 / 100.0,
                    "PORTFOYBUYUKLUK": 1_000_000.0,
                    "KISISAYISI": 500 + offset,
                })
            })
            .collect();
        json!({ "data": rows }).to_string()
    }

    pub fn allocation_body(date: NaiveDate) -> String {
        json!({ "data": [
            { "TARIH": epoch_ms(date), "HS": 55.5, "DT": 30.0, "KM": 0.0, "R": 14.5 }
        ]})
        .to_string()
    }

    pub async fn create_mock_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200).append_header("set-cookie", "ASP.NET_SessionId=test; path=/"),
            )
            .mount(&server)
            .await;
        server
    }

    pub async fn mount_info(server: &MockServer, body: String, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path(super::INFO_ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    pub async fn mount_allocation(server: &MockServer, status: u16, body: String) {
        Mock::given(method("POST"))
            .and(path(super::ALLOCATION_ENDPOINT))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn service(server: &wiremock::MockServer, store: Option<MemoryStore>) -> FundHistoryService {
    let provider = TefasProvider::new(&server.uri(), Duration::from_secs(5)).unwrap();
    FundHistoryService::new(
        Arc::new(provider),
        store.map(|s| Arc::new(s) as Arc<dyn FundStore>),
    )
    .with_plan(ChunkPlan {
        retries: 0,
        retry_delay_ms: 0,
        ..ChunkPlan::default()
    })
}

fn request(code: &str, days: i64) -> OverviewRequest {
    OverviewRequest {
        code: code.to_string(),
        kind: FundKind::Yat,
        days,
    }
}

#[test_log::test(tokio::test)]
async fn test_empty_cache_sync_persists_history() {
    let server = test_utils::create_mock_server().await;
    test_utils::mount_info(&server, test_utils::info_body("AAA", today(), 20), 1).await;
    test_utils::mount_allocation(&server, 200, test_utils::allocation_body(today())).await;

    let store = MemoryStore::new();
    let overview = service(&server, Some(store.clone()))
        .overview(&request("AAA", 30))
        .await
        .unwrap();
    info!(points = overview.price_history.len(), "Fetched overview");

    assert_eq!(overview.price_history.len(), 20);
    assert!(
        overview
            .price_history
            .windows(2)
            .all(|pair| pair[0].date < pair[1].date)
    );
    assert_eq!(overview.latest_date, today());
    assert_eq!(overview.title.as_deref(), Some("AAA Fund"));
    assert_eq!(overview.latest_price, 2.0);

    let labels: Vec<_> = overview.allocation.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["Stocks", "Government Bonds", "Repo"]);

    assert_eq!(store.observation_count("AAA").await, 20);
    assert_eq!(store.fund_count().await, 1);
    let fund = store.load_fund("AAA").await.unwrap().unwrap();
    assert_eq!(fund.latest_date, Some(today()));
}

#[test_log::test(tokio::test)]
async fn test_valid_cache_skips_upstream_history() {
    let server = test_utils::create_mock_server().await;
    test_utils::mount_info(&server, test_utils::info_body("AAA", today(), 30), 0).await;
    test_utils::mount_allocation(&server, 200, test_utils::allocation_body(today())).await;

    let store = MemoryStore::new();
    let cached: Vec<Observation> = (0..=30)
        .map(|offset| Observation {
            date: today() - chrono::Duration::days(30 - offset),
            price: Some(1.0 + offset as f64),
            market_cap: Some(10.0),
            investor_count: Some(7),
        })
        .collect();
    store.upsert_observations("AAA", &cached).await.unwrap();
    store
        .upsert_funds(&[Fund {
            code: "AAA".into(),
            kind: FundKind::Yat,
            title: Some("Cached Fund".into()),
            latest_date: Some(today()),
            updated_at: Utc::now(),
        }])
        .await
        .unwrap();

    let overview = service(&server, Some(store))
        .overview(&request("AAA", 30))
        .await
        .unwrap();

    assert_eq!(overview.price_history, SeriesKind::Price.build(&cached));
    assert_eq!(overview.investor_history, SeriesKind::Investors.build(&cached));
    assert_eq!(overview.title.as_deref(), Some("Cached Fund"));
    assert!(!overview.allocation.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_long_range_is_fetched_in_chunks() {
    let server = test_utils::create_mock_server().await;
    // Every window gets the same rows back; the merge collapses them
    test_utils::mount_info(&server, test_utils::info_body("AAA", today(), 10), 5).await;
    test_utils::mount_allocation(&server, 200, r#"{"data": []}"#.to_string()).await;

    let overview = service(&server, None)
        .overview(&request("AAA", 400))
        .await
        .unwrap();
    assert_eq!(overview.price_history.len(), 10);
    assert!(overview.allocation.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_allocation_failure_still_serves_history() {
    let server = test_utils::create_mock_server().await;
    test_utils::mount_info(&server, test_utils::info_body("AAA", today(), 5), 1).await;
    test_utils::mount_allocation(&server, 500, "oops".to_string()).await;

    let app = router(
        AppState::new(service(&server, None), RequestDefaults::default()),
        Duration::from_secs(10),
    );
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/fund-history?code=AAA&kind=YAT&days=30")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["fund"]["allocation"], serde_json::json!([]));
    assert_eq!(json["fund"]["priceHistory"].as_array().unwrap().len(), 5);
}

#[test_log::test(tokio::test)]
async fn test_upstream_outage_without_cache_is_an_error() {
    let server = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .respond_with(wiremock::ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = service(&server, Some(MemoryStore::new()))
        .overview(&request("AAA", 30))
        .await;
    assert!(matches!(
        result,
        Err(fundview::core::error::FundError::UpstreamUnavailable(_))
    ));
}
