use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::disposition::attachment;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue, Response, StatusCode},
    response::IntoResponse,
};
use futures::StreamExt;
use hashdrop_core::constants::DEFAULT_CONTENT_TYPE;
use hashdrop_core::AppError;
use hashdrop_infra::ErrorResponse;
use std::sync::Arc;

/// Digest recorded for the bytes being served, so clients can check what they got.
pub const CONTENT_SHA256_HEADER: &str = "x-content-sha256";

#[utoipa::path(
    get,
    path = "/download/{id}",
    tag = "uploads",
    params(
        ("id" = i64, Path, description = "Upload ID")
    ),
    responses(
        (status = 200, description = "Stored bytes", content_type = "application/octet-stream",
            headers(("X-Content-SHA256" = String, description = "Recorded SHA-256 of the content"))),
        (status = 404, description = "Unknown upload ID", body = ErrorResponse),
        (status = 500, description = "Stored file could not be read", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "download_upload"))]
pub async fn download_upload(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let retrieval = state.audit.retrieve(&id).await?;
    let record = retrieval.record;

    let body_stream = retrieval.stream.map(|result| {
        result.map_err(|e| std::io::Error::other(format!("Storage stream error: {}", e)))
    });

    // Client-declared types that are not valid header values fall back to octet-stream.
    let content_type = HeaderValue::from_str(&record.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, retrieval.content_length)
        .header(header::CONTENT_DISPOSITION, attachment(&record.original_name))
        .header(CONTENT_SHA256_HEADER, record.digest.as_str())
        .header(header::CACHE_CONTROL, "private, max-age=31536000, immutable")
        .body(Body::from_stream(body_stream))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}
