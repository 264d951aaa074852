// src/lib.rs
// Public library surface for the server binary, the chat demo and integration tests.

pub mod agent;
pub mod api;
pub mod classifier;
pub mod client;
pub mod config;
pub mod conversation;
pub mod labels;
pub mod logging;
pub mod metrics;
pub mod scoring;
pub mod verdict;

// `crate_root::api::router` and `crate_root::router` both work.
pub use crate::api::{router, AppState};
pub use crate::config::AppConfig;

use axum::Router;
use tracing::info;

/// Build the full application from the on-disk config: validated labels, both model
/// handles, Prometheus recorder and the `/metrics` route merged in.
pub async fn app() -> anyhow::Result<Router> {
    let cfg = AppConfig::load()?;
    app_with_config(&cfg)
}

pub fn app_with_config(cfg: &AppConfig) -> anyhow::Result<Router> {
    let state = AppState::from_config(cfg)?;
    let metrics = crate::metrics::Metrics::init()?;
    info!(
        classifier = %cfg.classifier.provider,
        llm = %cfg.llm.provider,
        "router assembled"
    );
    Ok(router(state).merge(metrics.router()))
}
