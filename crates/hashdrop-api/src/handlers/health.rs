//! Liveness and readiness probes.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Run an async check with timeout; returns "ready", "timeout", or "not_ready: {error}".
async fn run_check<F, E>(timeout: Duration, f: F) -> (bool, String)
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    match tokio::time::timeout(timeout, f).await {
        Ok(Ok(())) => (true, "ready".to_string()),
        Ok(Err(e)) => (false, format!("not_ready: {}", e)),
        Err(_) => (false, "timeout".to_string()),
    }
}

#[derive(serde::Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub catalog: String,
    pub storage: String,
}

/// Liveness probe - process is running.
pub async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "alive" })),
    )
}

/// Readiness probe - catalog reachable and content directory usable.
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (catalog_ok, catalog) = run_check(CHECK_TIMEOUT, state.catalog.ping()).await;
    let (storage_ok, storage) = run_check(CHECK_TIMEOUT, state.store.check_ready()).await;

    if !catalog_ok {
        tracing::error!(catalog = %catalog, "Catalog readiness check failed");
    }
    if !storage_ok {
        tracing::error!(storage = %storage, "Content store readiness check failed");
    }

    let ready = catalog_ok && storage_ok;
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse {
            status: if ready { "ready" } else { "not_ready" },
            catalog,
            storage,
        }),
    )
}
