//! HTTP surface over the sync engine.

pub mod error;
pub mod handlers;

use anyhow::{Context, Result};
use axum::{Router, http::StatusCode, routing::get};
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::core::config::{AppConfig, RequestDefaults};
use crate::sync::FundHistoryService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<FundHistoryService>,
    /// Applied when a request leaves `kind` or `days` out
    pub defaults: RequestDefaults,
}

impl AppState {
    pub fn new(service: FundHistoryService, defaults: RequestDefaults) -> Self {
        Self {
            service: Arc::new(service),
            defaults,
        }
    }
}

pub fn router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/api/funds", get(handlers::list_funds))
        .route("/api/fund-history", get(handlers::fund_history))
        .route("/api/fund-analytics", get(handlers::fund_analytics))
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
}

/// Binds the configured address and serves until the process is stopped.
pub async fn serve(config: &AppConfig, state: AppState) -> Result<()> {
    let app = router(
        state,
        Duration::from_secs(config.server.request_timeout_secs),
    );
    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("Server error")
}
