use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use hashdrop_core::models::VerifyReport;
use hashdrop_infra::ErrorResponse;
use std::sync::Arc;

/// Re-hash the stored bytes and compare with the digest recorded at upload time.
///
/// A mismatch or a missing file is reported in the body (`intact: false`), not as an
/// error status.
#[utoipa::path(
    get,
    path = "/verify/{id}",
    tag = "audit",
    params(
        ("id" = i64, Path, description = "Upload ID")
    ),
    responses(
        (status = 200, description = "Verification result", body = VerifyReport),
        (status = 404, description = "Unknown upload ID", body = ErrorResponse),
        (status = 500, description = "Stored file could not be read", body = ErrorResponse)
    )
)]
pub async fn verify_upload(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<VerifyReport>, HttpAppError> {
    Ok(Json(state.audit.verify(&id).await?))
}
