use crate::auth::Identity;
use crate::error::HttpAppError;
use crate::services::IncomingUpload;
use crate::state::AppState;
use crate::utils::upload::{file_part, is_file_field, multipart_error};
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use hashdrop_core::models::UploadResponse;
use hashdrop_infra::ErrorResponse;
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/upload",
    tag = "uploads",
    request_body(
        content_type = "multipart/form-data",
        description = "The file to store, in a part named `file`"
    ),
    responses(
        (status = 200, description = "File stored and fingerprinted", body = UploadResponse),
        (status = 400, description = "No file part or empty filename", body = ErrorResponse),
        (status = 413, description = "File exceeds the configured size limit", body = ErrorResponse),
        (status = 500, description = "Storage, digest or catalog failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, multipart),
    fields(uploader = %identity.uploader, role = ?identity.role, operation = "upload_file")
)]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let mut multipart = multipart?;

    // The field borrows the multipart stream, so the file is ingested in place.
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if !is_file_field(&field) {
            tracing::debug!(field = ?field.name(), "Skipping non-file multipart field");
            continue;
        }

        let upload = IncomingUpload {
            file: Some(file_part(field)),
        };
        let receipt = state.ingest.ingest(upload, &identity.uploader).await?;
        return Ok(Json(UploadResponse::from(receipt)));
    }

    // No file part: the pipeline reports it as a validation error.
    let receipt = state
        .ingest
        .ingest(IncomingUpload { file: None }, &identity.uploader)
        .await?;
    Ok(Json(UploadResponse::from(receipt)))
}
