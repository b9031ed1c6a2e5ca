//! Application setup and initialization
//!
//! Everything `main` needs, kept out of the binary so tests can build the same
//! router on top of an in-memory catalog.

pub mod database;
pub mod routes;
pub mod server;
pub mod services;
pub mod storage;
pub mod validation;

use crate::state::AppState;
use anyhow::{Context, Result};
use hashdrop_core::Config;
use hashdrop_db::UploadRepository;
use std::sync::Arc;
use std::time::Duration;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    hashdrop_infra::init_telemetry(config.log_format(), config.environment())
        .context("Failed to initialize telemetry")?;

    // Fail fast on misconfiguration
    validation::validate_config(&config).context("Configuration validation failed")?;

    tracing::info!(config = ?config, "Configuration loaded and validated successfully");

    let pool = database::setup_database(&config).await?;
    let store = storage::setup_storage(&config).await?;

    let state = services::initialize_services(&config, Arc::new(UploadRepository::new(pool)), store);

    if config.reconcile_interval_secs() > 0 {
        state
            .reconcile
            .clone()
            .start(Duration::from_secs(config.reconcile_interval_secs()));
        tracing::info!(
            interval_secs = config.reconcile_interval_secs(),
            "Scheduled reconciliation enabled"
        );
    } else {
        tracing::info!("Scheduled reconciliation disabled");
    }

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
