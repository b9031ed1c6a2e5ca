use chrono::{DateTime, Utc};

use crate::digest::is_valid_digest;
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One catalogued upload. Created once at the end of a successful ingest, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UploadRecord {
    pub id: i64,
    /// Client-supplied name. Untrusted and never used as a path component.
    pub original_name: String,
    pub stored_name: String,
    /// Lowercase hex SHA-256 of the stored bytes at insert time.
    pub digest: String,
    pub uploader: String,
    pub uploaded_at: DateTime<Utc>,
    pub size_bytes: i64,
    pub content_type: String,
}

/// Row to append to the catalog; the id is assigned on insert.
#[derive(Debug, Clone)]
pub struct NewUpload {
    pub original_name: String,
    pub stored_name: String,
    pub digest: String,
    pub uploader: String,
    pub uploaded_at: DateTime<Utc>,
    pub size_bytes: i64,
    pub content_type: String,
}

impl NewUpload {
    /// PostgreSQL text cannot hold NUL, so it is dropped from the client name.
    pub fn strip_nul(name: &str) -> String {
        name.chars().filter(|c| *c != '\0').collect()
    }

    /// Catalog rows only ever carry a lowercase hex SHA-256.
    pub fn check_digest(&self) -> Result<(), AppError> {
        if is_valid_digest(&self.digest) {
            Ok(())
        } else {
            Err(AppError::Internal(format!(
                "refusing to catalogue {} with malformed digest",
                self.stored_name
            )))
        }
    }

    pub fn into_record(self, id: i64) -> UploadRecord {
        UploadRecord {
            id,
            original_name: self.original_name,
            stored_name: self.stored_name,
            digest: self.digest,
            uploader: self.uploader,
            uploaded_at: self.uploaded_at,
            size_bytes: self.size_bytes,
            content_type: self.content_type,
        }
    }
}

/// Outcome of one successful ingest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReceipt {
    pub id: i64,
    pub filename: String,
    pub stored_name: String,
    pub sha256: String,
    pub size_bytes: i64,
    pub uploaded_at: DateTime<Utc>,
    pub uploader: String,
}

impl From<UploadRecord> for IngestReceipt {
    fn from(record: UploadRecord) -> Self {
        IngestReceipt {
            id: record.id,
            filename: record.original_name,
            stored_name: record.stored_name,
            sha256: record.digest,
            size_bytes: record.size_bytes,
            uploaded_at: record.uploaded_at,
            uploader: record.uploader,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    pub id: i64,
    pub filename: String,
    pub stored_name: String,
    pub sha256: String,
    pub size_bytes: i64,
    pub uploaded_at: DateTime<Utc>,
}

impl From<IngestReceipt> for UploadResponse {
    fn from(receipt: IngestReceipt) -> Self {
        UploadResponse {
            message: format!("File {} uploaded successfully", receipt.filename),
            id: receipt.id,
            filename: receipt.filename,
            stored_name: receipt.stored_name,
            sha256: receipt.sha256,
            size_bytes: receipt.size_bytes,
            uploaded_at: receipt.uploaded_at,
        }
    }
}
