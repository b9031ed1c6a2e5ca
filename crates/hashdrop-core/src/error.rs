//! Error types module
//!
//! All failures of the upload service are unified under `AppError`. Each variant
//! self-describes how it is presented over HTTP through `ErrorMetadata`, so the API
//! layer renders every error the same way.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx` feature.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like size limits
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "DATABASE_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage write failed: {0}")]
    StorageWrite(String),

    #[error("Storage read failed: {0}")]
    StorageRead(String),

    /// Staged bytes could not be read back for fingerprinting; the upload was discarded.
    #[error("Digest computation failed: {0}")]
    DigestCompute(String),

    /// The commit was sent but its result never came back; the row may or may not exist.
    #[error("Catalog commit outcome unknown: {0}")]
    CommitOutcomeUnknown(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        match err {
            SqlxError::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(db_err.message().to_string())
            }
            other => AppError::Database(other),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(format!("Validation error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::Database(_) => (
            500,
            "DATABASE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::StorageWrite(_) => (
            500,
            "STORAGE_WRITE_ERROR",
            true,
            Some("Retry the upload after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::StorageRead(_) => (
            500,
            "STORAGE_READ_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::DigestCompute(_) => (
            500,
            "DIGEST_COMPUTE_ERROR",
            true,
            Some("Retry the upload"),
            true,
            LogLevel::Error,
        ),
        AppError::CommitOutcomeUnknown(_) => (
            500,
            "COMMIT_OUTCOME_UNKNOWN",
            false,
            Some("Check the audit endpoint before retrying the upload"),
            true,
            LogLevel::Error,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the filename or upload ID exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::Conflict(_) => (
            409,
            "CONFLICT",
            true,
            Some("Retry the upload"),
            false,
            LogLevel::Warn,
        ),
        AppError::PayloadTooLarge(_) => (
            413,
            "PAYLOAD_TOO_LARGE",
            false,
            Some("Reduce file size"),
            false,
            LogLevel::Debug,
        ),
        AppError::Unauthorized(_) => (
            401,
            "UNAUTHORIZED",
            false,
            Some("Check the admin API key"),
            false,
            LogLevel::Debug,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Database(_) => "Database",
            AppError::StorageWrite(_) => "StorageWrite",
            AppError::StorageRead(_) => "StorageRead",
            AppError::DigestCompute(_) => "DigestCompute",
            AppError::CommitOutcomeUnknown(_) => "CommitOutcomeUnknown",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::NotFound(_) => "NotFound",
            AppError::Conflict(_) => "Conflict",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access catalog".to_string(),
            AppError::StorageWrite(_) => "Failed to store file".to_string(),
            AppError::StorageRead(_) => "Failed to read stored file".to_string(),
            AppError::DigestCompute(_) => {
                "File could not be read back for fingerprinting; nothing was stored".to_string()
            }
            AppError::CommitOutcomeUnknown(_) => {
                "Upload may or may not have been catalogued".to_string()
            }
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::Conflict(ref msg) => msg.clone(),
            AppError::PayloadTooLarge(ref msg) => msg.clone(),
            AppError::Unauthorized(ref msg) => msg.clone(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_database() {
        #[cfg(feature = "sqlx")]
        let err = AppError::from(sqlx::Error::PoolClosed);
        #[cfg(not(feature = "sqlx"))]
        let err = AppError::Database("pool closed".to_string());
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "DATABASE_ERROR");
        assert!(err.is_recoverable());
        assert_eq!(err.client_message(), "Failed to access catalog");
        assert!(err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_error_metadata_not_found() {
        let err = AppError::NotFound("File not found".to_string());
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "File not found");
        assert!(!err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn digest_failure_is_distinct_from_validation() {
        let digest = AppError::DigestCompute("read failed".to_string());
        let validation = AppError::InvalidInput("No file selected".to_string());

        assert_eq!(digest.http_status_code(), 500);
        assert_eq!(digest.error_code(), "DIGEST_COMPUTE_ERROR");
        assert_eq!(validation.http_status_code(), 400);
        assert_ne!(digest.error_code(), validation.error_code());
        assert!(!digest.client_message().contains("read failed"));
    }

    #[test]
    fn digest_failure_tells_client_nothing_was_stored() {
        let err = AppError::DigestCompute("read failed".to_string());
        assert_eq!(
            err.client_message(),
            "File could not be read back for fingerprinting; nothing was stored"
        );
        assert_eq!(err.suggested_action(), Some("Retry the upload"));
    }

    #[test]
    fn stored_file_read_failure_does_not_suggest_reupload() {
        let err = AppError::StorageRead("EIO".to_string());
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "STORAGE_READ_ERROR");
        assert_eq!(err.client_message(), "Failed to read stored file");
        assert_eq!(err.suggested_action(), Some("Retry after a short delay"));
    }

    #[test]
    fn unknown_commit_outcome_does_not_suggest_blind_retry() {
        let err = AppError::CommitOutcomeUnknown("connection reset".to_string());
        assert_eq!(err.http_status_code(), 500);
        assert!(!err.is_recoverable());
        assert_eq!(
            err.suggested_action(),
            Some("Check the audit endpoint before retrying the upload")
        );
        assert!(!err.client_message().contains("connection reset"));
    }

    #[test]
    fn test_error_metadata_storage_write() {
        let err = AppError::StorageWrite("disk full".to_string());
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "STORAGE_WRITE_ERROR");
        assert!(err.is_sensitive());
        assert_eq!(err.error_type(), "StorageWrite");
    }

    #[test]
    fn test_detailed_message_includes_source_chain() {
        let err = AppError::InternalWithSource {
            message: "outer".to_string(),
            source: anyhow::anyhow!("inner cause"),
        };
        let details = err.detailed_message();
        assert!(details.contains("Caused by: inner cause"));
    }

    #[test]
    fn test_error_metadata_suggested_actions() {
        let err = AppError::NotFound("test".to_string());
        assert_eq!(
            err.suggested_action(),
            Some("Verify the filename or upload ID exists")
        );

        let err = AppError::InvalidInput("test".to_string());
        assert_eq!(
            err.suggested_action(),
            Some("Check request parameters and try again")
        );
    }
}
