//! Multipart plumbing for the upload handler

use crate::services::{BodyLimitExceeded, FilePart};
use axum::extract::multipart::{Field, MultipartError};
use axum::http::StatusCode;
use futures::TryStreamExt;
use hashdrop_core::constants::FILE_FIELD;
use hashdrop_core::AppError;
use tokio_util::io::StreamReader;

pub fn is_file_field(field: &Field<'_>) -> bool {
    field.name() == Some(FILE_FIELD)
}

/// Expose a multipart field as a byte reader for the ingest pipeline.
pub fn file_part(field: Field<'_>) -> FilePart<'_> {
    let filename = field.file_name().map(str::to_string);
    let content_type = field.content_type().map(str::to_string);
    let stream = field.map_err(into_io_error);

    FilePart {
        filename,
        content_type,
        body: Box::pin(StreamReader::new(stream)),
    }
}

fn is_body_limit(err: &MultipartError) -> bool {
    err.status() == StatusCode::PAYLOAD_TOO_LARGE
}

// Body-limit failures keep a typed marker so ingest can answer 413 rather than 400.
fn into_io_error(err: MultipartError) -> std::io::Error {
    if is_body_limit(&err) {
        std::io::Error::other(BodyLimitExceeded)
    } else {
        std::io::Error::other(err.body_text())
    }
}

pub fn multipart_error(err: MultipartError) -> AppError {
    if is_body_limit(&err) {
        AppError::PayloadTooLarge("Request body exceeds the configured limit".to_string())
    } else {
        AppError::InvalidInput(format!("Failed to read multipart: {}", err.body_text()))
    }
}
