//! Admin-only views over the catalog. Mounted behind `require_admin`.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use hashdrop_core::models::{
    integrity_map, IntegrityMap, ReconcileReport, UploadListQuery, UploadListResponse,
};
use hashdrop_infra::ErrorResponse;
use std::sync::Arc;
use validator::Validate;

#[utoipa::path(
    get,
    path = "/admin/uploads",
    tag = "admin",
    params(UploadListQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Uploads, newest first", body = UploadListResponse),
        (status = 400, description = "Invalid pagination parameters", body = ErrorResponse),
        (status = 401, description = "Missing or invalid admin key", body = ErrorResponse)
    )
)]
pub async fn list_uploads(
    State(state): State<Arc<AppState>>,
    query: Result<Query<UploadListQuery>, QueryRejection>,
) -> Result<Json<UploadListResponse>, HttpAppError> {
    let Query(query) = query?;
    query.validate()?;

    let items = state.catalog.list_page(query.limit, query.offset).await?;
    let total = state.catalog.count().await?;

    Ok(Json(UploadListResponse {
        items,
        total,
        limit: query.limit,
        offset: query.offset,
    }))
}

/// Latest digest per original filename, derived from the catalog on every call.
#[utoipa::path(
    get,
    path = "/admin/integrity",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Map of original filename to latest SHA-256", body = std::collections::BTreeMap<String, String>),
        (status = 401, description = "Missing or invalid admin key", body = ErrorResponse)
    )
)]
pub async fn integrity(
    State(state): State<Arc<AppState>>,
) -> Result<Json<IntegrityMap>, HttpAppError> {
    let records = state.catalog.list_all().await?;
    Ok(Json(integrity_map(&records)))
}

#[utoipa::path(
    post,
    path = "/admin/reconcile",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Reconciliation report", body = ReconcileReport),
        (status = 401, description = "Missing or invalid admin key", body = ErrorResponse)
    )
)]
pub async fn reconcile(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReconcileReport>, HttpAppError> {
    Ok(Json(state.reconcile.run_once().await?))
}
