//! Read-only lookups over the catalog: digest audit, byte retrieval, and
//! server-side re-verification of stored content.

use std::sync::Arc;

use hashdrop_core::models::{AuditReport, UploadRecord, VerifyReport};
use hashdrop_core::{digest_reader, AppError};
use hashdrop_db::Catalog;
use hashdrop_storage::{ByteStream, ContentStore, StorageError};

/// Stored bytes of one upload plus the record describing them.
pub struct Retrieval {
    pub record: UploadRecord,
    pub content_length: u64,
    pub stream: ByteStream,
}

pub struct AuditService {
    catalog: Arc<dyn Catalog>,
    store: Arc<dyn ContentStore>,
}

/// Ids are positive integers; anything else cannot name an upload.
fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|id| *id > 0)
}

fn not_found() -> AppError {
    AppError::NotFound("Upload not found".to_string())
}

impl AuditService {
    pub fn new(catalog: Arc<dyn Catalog>, store: Arc<dyn ContentStore>) -> Self {
        Self { catalog, store }
    }

    /// Latest digest for a name, falling back to an id lookup when no upload has
    /// that name and it parses as an id.
    #[tracing::instrument(skip(self), fields(operation = "audit"))]
    pub async fn audit(&self, name_or_id: &str) -> Result<AuditReport, AppError> {
        if let Some(record) = self.catalog.find_latest_by_name(name_or_id).await? {
            return Ok(record.into());
        }

        let record = match parse_id(name_or_id) {
            Some(id) => self.catalog.find_by_id(id).await?,
            None => None,
        };

        record.map(AuditReport::from).ok_or_else(not_found)
    }

    async fn record(&self, raw_id: &str) -> Result<UploadRecord, AppError> {
        let id = parse_id(raw_id).ok_or_else(not_found)?;
        self.catalog.find_by_id(id).await?.ok_or_else(not_found)
    }

    #[tracing::instrument(skip(self), fields(operation = "retrieve"))]
    pub async fn retrieve(&self, raw_id: &str) -> Result<Retrieval, AppError> {
        let record = self.record(raw_id).await?;

        let content_length = self.store.content_length(&record.stored_name).await?;
        let stream = self.store.download_stream(&record.stored_name).await?;

        tracing::debug!(
            upload_id = record.id,
            stored_name = %record.stored_name,
            content_length,
            "Streaming stored upload"
        );

        Ok(Retrieval {
            record,
            content_length,
            stream,
        })
    }

    /// Recompute the digest of the stored bytes and compare it with the catalog.
    #[tracing::instrument(skip(self), fields(operation = "verify"))]
    pub async fn verify(&self, raw_id: &str) -> Result<VerifyReport, AppError> {
        let record = self.record(raw_id).await?;

        let actual = match self.store.open(&record.stored_name).await {
            Ok(reader) => Some(
                digest_reader(reader)
                    .await
                    .map_err(|e| AppError::StorageRead(e.to_string()))?,
            ),
            Err(StorageError::NotFound(_)) => None,
            Err(e) => return Err(e.into()),
        };

        let report = VerifyReport::new(&record, actual);
        if !report.intact {
            tracing::error!(
                upload_id = record.id,
                stored_name = %record.stored_name,
                recorded = %report.recorded,
                actual = ?report.actual,
                "Stored content does not match its recorded digest"
            );
        }

        Ok(report)
    }
}
