use std::collections::HashSet;

use async_trait::async_trait;
use hashdrop_core::{
    models::{NewUpload, UploadRecord},
    AppError,
};

/// Append-only catalog of uploads.
///
/// Listings are newest first (`uploaded_at DESC, id DESC`); name lookups resolve to
/// the most recent row with that original name.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Append one row and return it with its assigned id.
    ///
    /// A duplicate `stored_name` is reported as [`AppError::Conflict`] and a
    /// malformed digest is refused before anything is written.
    /// [`AppError::CommitOutcomeUnknown`] means the row may exist anyway.
    async fn insert(&self, upload: NewUpload) -> Result<UploadRecord, AppError>;

    async fn find_latest_by_name(&self, original_name: &str)
        -> Result<Option<UploadRecord>, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<UploadRecord>, AppError>;

    async fn list_all(&self) -> Result<Vec<UploadRecord>, AppError>;

    async fn list_page(&self, limit: i64, offset: i64) -> Result<Vec<UploadRecord>, AppError>;

    async fn count(&self) -> Result<i64, AppError>;

    async fn stored_names(&self) -> Result<HashSet<String>, AppError>;

    /// Cheap round trip used by the readiness probe.
    async fn ping(&self) -> Result<(), AppError>;
}
