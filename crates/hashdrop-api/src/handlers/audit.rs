use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use hashdrop_core::models::AuditReport;
use hashdrop_infra::ErrorResponse;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/audit/{name_or_id}",
    tag = "audit",
    params(
        ("name_or_id" = String, Path, description = "Original filename (latest upload wins) or upload ID")
    ),
    responses(
        (status = 200, description = "Recorded digest", body = AuditReport),
        (status = 404, description = "No upload with that name or ID", body = ErrorResponse)
    )
)]
pub async fn audit_upload(
    State(state): State<Arc<AppState>>,
    Path(name_or_id): Path<String>,
) -> Result<Json<AuditReport>, HttpAppError> {
    let report = state.audit.audit(&name_or_id).await?;
    Ok(Json(report))
}
