//! Route configuration and setup.

use crate::api_doc::ApiDoc;
use crate::auth::{identity_middleware, require_admin};
use crate::handlers::{admin, audit, download, health, upload, verify};
use crate::state::AppState;
use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use hashdrop_core::Config;
use hashdrop_infra::{get_request_id, request_id_middleware, security_headers_middleware};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let public_routes = Router::new()
        .route("/upload", post(upload::upload_file))
        .route("/audit/{name_or_id}", get(audit::audit_upload))
        .route("/download/{id}", get(download::download_upload))
        .route("/verify/{id}", get(verify::verify_upload));

    let admin_routes = Router::new()
        .route("/admin/uploads", get(admin::list_uploads))
        .route("/admin/integrity", get(admin::integrity))
        .route("/admin/reconcile", post(admin::reconcile))
        .layer(axum::middleware::from_fn_with_state(
            state.auth.clone(),
            require_admin,
        ));

    let health_routes = Router::new()
        .route("/health", get(health::liveness_check))
        .route("/health/ready", get(health::readiness_check));

    let body_limit = request_body_limit(config)?;
    tracing::info!(
        http_concurrency_limit = config.http_concurrency_limit(),
        body_limit_bytes = body_limit,
        "HTTP limits configured"
    );

    let app = public_routes
        .merge(admin_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.auth.clone(),
            identity_middleware,
        ))
        .merge(health_routes)
        .route(
            "/api/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .merge(utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"))
        .layer(ConcurrencyLimitLayer::new(config.http_concurrency_limit()))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .with_state(state);

    Ok(app)
}

fn request_body_limit(config: &Config) -> Result<usize, anyhow::Error> {
    config
        .max_file_size_bytes()
        .checked_add(MULTIPART_OVERHEAD_BYTES)
        .ok_or_else(|| anyhow::anyhow!("MAX_FILE_SIZE_MB leaves no room for multipart overhead"))
}

/// HTTP span carrying the id set by `request_id_middleware`, which wraps the trace layer.
fn request_span(request: &Request) -> tracing::Span {
    let request_id = get_request_id(request).unwrap_or_default();
    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}
