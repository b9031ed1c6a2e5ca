//! Content store abstraction
//!
//! The ingest pipeline, the audit service and the reconciliation sweep only talk to
//! this trait, never to the filesystem directly.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use hashdrop_core::AppError;
use std::pin::Pin;
use std::time::SystemTime;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Writing to the content directory failed.
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    /// The incoming byte source failed before EOF (client abort, malformed body).
    #[error("Source stream failed: {0}")]
    SourceFailed(#[source] std::io::Error),

    #[error("Content exceeds limit of {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid stored name: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

pub type ContentReader = Pin<Box<dyn AsyncRead + Send>>;

/// A file sitting in the staging area.
#[derive(Debug, Clone)]
pub struct StagedEntry {
    pub name: String,
    pub modified: SystemTime,
}

/// Content directory operations, keyed by stored name.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Stream `reader` into the staging area until EOF and fsync it.
    ///
    /// Returns the number of bytes written. More than `max_bytes` aborts with
    /// [`StorageError::TooLarge`] and removes the partial file.
    async fn stage(
        &self,
        stored_name: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
        max_bytes: u64,
    ) -> StorageResult<u64>;

    /// Open a staged file for reading.
    async fn open_staged(&self, stored_name: &str) -> StorageResult<ContentReader>;

    /// Atomically move a staged file into the content directory.
    ///
    /// Never overwrites existing content.
    async fn promote(&self, stored_name: &str) -> StorageResult<()>;

    /// Remove a staged file. Missing files are not an error.
    async fn discard_staged(&self, stored_name: &str) -> StorageResult<()>;

    /// Remove promoted content. Missing files are not an error.
    async fn remove(&self, stored_name: &str) -> StorageResult<()>;

    async fn open(&self, stored_name: &str) -> StorageResult<ContentReader>;

    /// Stream promoted content in chunks.
    async fn download_stream(&self, stored_name: &str) -> StorageResult<ByteStream>;

    async fn content_length(&self, stored_name: &str) -> StorageResult<u64>;

    /// Names of all promoted files.
    async fn list_stored_names(&self) -> StorageResult<Vec<String>>;

    async fn list_staged(&self) -> StorageResult<Vec<StagedEntry>>;

    /// Fails when the content directory is not usable.
    async fn check_ready(&self) -> StorageResult<()>;
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            // A refused name is indistinguishable from an unknown one to clients.
            StorageError::NotFound(_) | StorageError::InvalidKey(_) => {
                AppError::NotFound("File not found".to_string())
            }
            StorageError::TooLarge { limit } => AppError::PayloadTooLarge(format!(
                "File exceeds maximum size of {} bytes",
                limit
            )),
            StorageError::SourceFailed(e) => {
                AppError::InvalidInput(format!("Failed to read upload body: {}", e))
            }
            StorageError::WriteFailed(msg) | StorageError::DeleteFailed(msg) => {
                AppError::StorageWrite(msg)
            }
            StorageError::IoError(e) => AppError::StorageWrite(e.to_string()),
            StorageError::ReadFailed(msg) => AppError::StorageRead(msg),
            StorageError::ConfigError(msg) => AppError::Internal(msg),
        }
    }
}
