pub mod analytics;
pub mod api;
pub mod cli;
pub mod core;
pub mod overview;
pub mod providers;
pub mod store;
pub mod sync;

#[cfg(test)]
mod testing;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::api::AppState;
use crate::core::config::AppConfig;
use crate::providers::TefasProvider;
use crate::sync::FundHistoryService;

pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

/// Wires the upstream client and the cache store into the request state.
pub fn build_state(config: &AppConfig) -> Result<AppState> {
    let source = TefasProvider::new(
        &config.upstream.base_url,
        Duration::from_secs(config.upstream.timeout_secs),
    )?;
    let store = store::open(config);
    let service = FundHistoryService::from_config(Arc::new(source), store, config);
    Ok(AppState::new(service, config.defaults.clone()))
}

pub async fn run_server(config_path: Option<&str>) -> Result<()> {
    info!("fundview starting...");
    let config = load_config(config_path)?;
    let state = build_state(&config)?;
    api::serve(&config, state).await
}
