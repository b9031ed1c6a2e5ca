//! Upload ingest pipeline
//!
//! validate → stage → digest → promote → catalog
//!
//! Bytes are streamed into the staging area and fingerprinted from disk after fsync,
//! so the recorded digest is always the digest of what was persisted. Content only
//! appears in the content directory once its digest is known. A catalog insert
//! that failed before commit removes the promoted file again. When the commit
//! outcome is unknown the file is kept, so a row that did land never points at
//! missing bytes; the reconciliation sweep reports it if it turns out orphaned.

use std::pin::Pin;
use std::sync::Arc;

use chrono::Utc;
use hashdrop_core::constants::{DEFAULT_CONTENT_TYPE, MAX_ORIGINAL_NAME_LEN};
use hashdrop_core::models::{IngestReceipt, NewUpload};
use hashdrop_core::{digest_reader, stored_name_for, AppError};
use hashdrop_db::Catalog;
use hashdrop_storage::{ContentStore, StorageError};
use tokio::io::AsyncRead;

/// Marker carried inside an `io::Error` when the HTTP body limit cut the upload short.
#[derive(Debug, thiserror::Error)]
#[error("request body exceeded the configured limit")]
pub struct BodyLimitExceeded;

/// The `file` part of an upload request.
pub struct FilePart<'a> {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub body: Pin<Box<dyn AsyncRead + Send + 'a>>,
}

/// One upload request as seen by the pipeline. `file` is `None` when the request
/// carried no `file` field.
pub struct IncomingUpload<'a> {
    pub file: Option<FilePart<'a>>,
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("{0}")]
    Validation(String),

    #[error("File exceeds the maximum size of {limit} bytes")]
    PayloadTooLarge { limit: u64 },

    #[error("Storage write failed: {0}")]
    StorageWrite(String),

    #[error("Digest computation failed: {0}")]
    DigestCompute(String),

    #[error("Catalog insert failed: {0}")]
    Catalog(#[source] AppError),
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Validation(msg) => AppError::InvalidInput(msg),
            IngestError::PayloadTooLarge { limit } => AppError::PayloadTooLarge(format!(
                "File size exceeds maximum allowed size of {} bytes",
                limit
            )),
            IngestError::StorageWrite(msg) => AppError::StorageWrite(msg),
            IngestError::DigestCompute(msg) => AppError::DigestCompute(msg),
            IngestError::Catalog(inner) => inner,
        }
    }
}

pub struct IngestService {
    catalog: Arc<dyn Catalog>,
    store: Arc<dyn ContentStore>,
    max_file_size: u64,
}

impl IngestService {
    pub fn new(catalog: Arc<dyn Catalog>, store: Arc<dyn ContentStore>, max_file_size: u64) -> Self {
        Self {
            catalog,
            store,
            max_file_size,
        }
    }

    #[tracing::instrument(skip(self, upload), fields(uploader = %uploader, operation = "ingest"))]
    pub async fn ingest(
        &self,
        upload: IncomingUpload<'_>,
        uploader: &str,
    ) -> Result<IngestReceipt, IngestError> {
        let mut file = upload
            .file
            .ok_or_else(|| IngestError::Validation("No file provided".to_string()))?;
        let original_name = validate_filename(file.filename.as_deref())?;
        let content_type = file
            .content_type
            .take()
            .map(|ct| ct.trim().to_string())
            .filter(|ct| !ct.is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        let stored_name = stored_name_for(&original_name, Utc::now());

        let size = self
            .store
            .stage(&stored_name, &mut file.body, self.max_file_size)
            .await
            .map_err(|e| self.stage_error(e))?;

        let digest = match self.digest_staged(&stored_name).await {
            Ok(digest) => digest,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    stored_name = %stored_name,
                    "Failed to compute digest of staged upload"
                );
                self.discard(&stored_name).await;
                return Err(IngestError::DigestCompute(e));
            }
        };

        if let Err(e) = self.store.promote(&stored_name).await {
            self.discard(&stored_name).await;
            return Err(IngestError::StorageWrite(e.to_string()));
        }

        let new_upload = NewUpload {
            original_name,
            stored_name: stored_name.clone(),
            digest,
            uploader: uploader.to_string(),
            uploaded_at: Utc::now(),
            size_bytes: size as i64,
            content_type,
        };

        let record = match self.catalog.insert(new_upload).await {
            Ok(record) => record,
            Err(e @ AppError::CommitOutcomeUnknown(_)) => {
                tracing::error!(
                    error = %e,
                    stored_name = %stored_name,
                    "Catalog commit outcome unknown; keeping promoted file for reconciliation"
                );
                return Err(IngestError::Catalog(e));
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    stored_name = %stored_name,
                    "Catalog insert failed; removing promoted file"
                );
                if let Err(cleanup) = self.store.remove(&stored_name).await {
                    tracing::error!(
                        error = %cleanup,
                        stored_name = %stored_name,
                        "Failed to remove uncatalogued file; left for reconciliation"
                    );
                }
                return Err(IngestError::Catalog(e));
            }
        };

        tracing::info!(
            upload_id = record.id,
            stored_name = %record.stored_name,
            sha256 = %record.digest,
            size_bytes = record.size_bytes,
            "Upload ingested"
        );

        Ok(IngestReceipt::from(record))
    }

    async fn digest_staged(&self, stored_name: &str) -> Result<String, String> {
        let reader = self
            .store
            .open_staged(stored_name)
            .await
            .map_err(|e| e.to_string())?;
        digest_reader(reader).await.map_err(|e| e.to_string())
    }

    async fn discard(&self, stored_name: &str) {
        if let Err(e) = self.store.discard_staged(stored_name).await {
            tracing::warn!(
                error = %e,
                stored_name = %stored_name,
                "Failed to discard staged upload"
            );
        }
    }

    fn stage_error(&self, err: StorageError) -> IngestError {
        match err {
            StorageError::TooLarge { limit } => IngestError::PayloadTooLarge { limit },
            StorageError::SourceFailed(e) if is_body_limit(&e) => IngestError::PayloadTooLarge {
                limit: self.max_file_size,
            },
            StorageError::SourceFailed(e) => {
                IngestError::Validation(format!("Failed to read upload body: {}", e))
            }
            other => IngestError::StorageWrite(other.to_string()),
        }
    }
}

fn is_body_limit(err: &std::io::Error) -> bool {
    err.get_ref()
        .is_some_and(|inner| inner.is::<BodyLimitExceeded>())
}

fn validate_filename(filename: Option<&str>) -> Result<String, IngestError> {
    let name = filename.unwrap_or_default();
    if name.trim().is_empty() {
        return Err(IngestError::Validation(
            "Filename must not be empty".to_string(),
        ));
    }
    if name.len() > MAX_ORIGINAL_NAME_LEN {
        return Err(IngestError::Validation(format!(
            "Filename exceeds {} bytes",
            MAX_ORIGINAL_NAME_LEN
        )));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hashdrop_core::{digest_bytes, ErrorMetadata, EMPTY_SHA256};
    use hashdrop_db::MemoryCatalog;
    use hashdrop_storage::{ByteStream, ContentReader, LocalStorage, StagedEntry, StorageResult};
    use std::io::Cursor;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        catalog: Arc<MemoryCatalog>,
        store: Arc<LocalStorage>,
        service: IngestService,
    }

    async fn fixture(max_file_size: u64) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalStorage::new(dir.path()).await.unwrap());
        let catalog = Arc::new(MemoryCatalog::new());
        let service = IngestService::new(catalog.clone(), store.clone(), max_file_size);
        Fixture {
            dir,
            catalog,
            store,
            service,
        }
    }

    fn upload(name: &str, body: &[u8]) -> IncomingUpload<'static> {
        IncomingUpload {
            file: Some(FilePart {
                filename: Some(name.to_string()),
                content_type: Some("text/plain".to_string()),
                body: Box::pin(Cursor::new(body.to_vec())),
            }),
        }
    }

    #[tokio::test]
    async fn ingest_records_digest_of_persisted_bytes() {
        let f = fixture(1024).await;
        let receipt = f.service.ingest(upload("notes.txt", b"hello"), "anonymous").await.unwrap();

        assert_eq!(receipt.sha256, digest_bytes(b"hello"));
        assert_eq!(receipt.size_bytes, 5);
        assert_eq!(receipt.filename, "notes.txt");
        assert_eq!(receipt.uploader, "anonymous");

        let on_disk = std::fs::read(f.dir.path().join(&receipt.stored_name)).unwrap();
        assert_eq!(on_disk, b"hello");
        assert!(f.store.list_staged().await.unwrap().is_empty());
        assert_eq!(f.catalog.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn empty_file_is_valid() {
        let f = fixture(1024).await;
        let receipt = f.service.ingest(upload("empty.txt", b""), "anonymous").await.unwrap();
        assert_eq!(receipt.sha256, EMPTY_SHA256);
        assert_eq!(receipt.size_bytes, 0);
    }

    #[tokio::test]
    async fn same_name_twice_gets_distinct_stored_names() {
        let f = fixture(1024).await;
        let first = f.service.ingest(upload("report.pdf", b"v1"), "anonymous").await.unwrap();
        let second = f.service.ingest(upload("report.pdf", b"v2"), "anonymous").await.unwrap();

        assert_ne!(first.stored_name, second.stored_name);
        let latest = f.catalog.find_latest_by_name("report.pdf").await.unwrap().unwrap();
        assert_eq!(latest.id, second.id);
        assert_eq!(latest.digest, digest_bytes(b"v2"));
    }

    #[tokio::test]
    async fn traversal_name_is_kept_inside_content_dir() {
        let f = fixture(1024).await;
        let receipt = f
            .service
            .ingest(upload("../../etc/passwd", b"root:x"), "anonymous")
            .await
            .unwrap();

        assert!(receipt.stored_name.ends_with("_passwd"));
        assert_eq!(receipt.filename, "../../etc/passwd");
        assert!(f.dir.path().join(&receipt.stored_name).is_file());
    }

    #[tokio::test]
    async fn missing_file_field_is_validation_error() {
        let f = fixture(1024).await;
        let err = f
            .service
            .ingest(IncomingUpload { file: None }, "anonymous")
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Validation(_)));
        assert_eq!(f.catalog.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn empty_or_overlong_filename_is_rejected_without_side_effects() {
        let f = fixture(1024).await;
        let overlong = "a".repeat(MAX_ORIGINAL_NAME_LEN + 1);
        for name in ["", "   ", overlong.as_str()] {
            let err = f.service.ingest(upload(name, b"x"), "anonymous").await.unwrap_err();
            assert!(matches!(err, IngestError::Validation(_)), "{name:?}");
        }
        assert!(f.store.list_staged().await.unwrap().is_empty());
        assert!(f.store.list_stored_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn oversize_upload_leaves_nothing_behind() {
        let f = fixture(4).await;
        let err = f.service.ingest(upload("big.bin", b"12345"), "anonymous").await.unwrap_err();

        assert!(matches!(err, IngestError::PayloadTooLarge { limit: 4 }));
        assert!(f.store.list_staged().await.unwrap().is_empty());
        assert!(f.store.list_stored_names().await.unwrap().is_empty());
        assert_eq!(f.catalog.count().await.unwrap(), 0);
    }

    struct LimitedBody;

    impl AsyncRead for LimitedBody {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &mut tokio::io::ReadBuf<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Err(std::io::Error::other(BodyLimitExceeded)))
        }
    }

    #[tokio::test]
    async fn body_limit_from_transport_is_payload_too_large() {
        let f = fixture(1024).await;
        let incoming = IncomingUpload {
            file: Some(FilePart {
                filename: Some("big.bin".to_string()),
                content_type: None,
                body: Box::pin(LimitedBody),
            }),
        };
        let err = f.service.ingest(incoming, "anonymous").await.unwrap_err();
        assert!(matches!(err, IngestError::PayloadTooLarge { limit: 1024 }));
    }

    #[tokio::test]
    async fn catalog_failure_removes_promoted_file() {
        let f = fixture(1024).await;
        f.catalog.fail_inserts(true);

        let err = f.service.ingest(upload("a.txt", b"a"), "anonymous").await.unwrap_err();
        assert!(matches!(err, IngestError::Catalog(_)));
        assert!(f.store.list_stored_names().await.unwrap().is_empty());
        assert!(f.store.list_staged().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_commit_outcome_keeps_promoted_file() {
        let f = fixture(1024).await;
        f.catalog.lose_commits(true);

        let err = f.service.ingest(upload("a.txt", b"a"), "anonymous").await.unwrap_err();
        assert!(matches!(
            err,
            IngestError::Catalog(AppError::CommitOutcomeUnknown(_))
        ));

        let row = f.catalog.find_latest_by_name("a.txt").await.unwrap().unwrap();
        let on_disk = std::fs::read(f.dir.path().join(&row.stored_name)).unwrap();
        assert_eq!(digest_bytes(&on_disk), row.digest);
        assert!(f.store.list_staged().await.unwrap().is_empty());
    }

    /// Local storage whose staged files cannot be read back.
    struct UnreadableStaging(LocalStorage);

    #[async_trait]
    impl ContentStore for UnreadableStaging {
        async fn stage(
            &self,
            stored_name: &str,
            reader: &mut (dyn AsyncRead + Send + Unpin),
            max_bytes: u64,
        ) -> StorageResult<u64> {
            self.0.stage(stored_name, reader, max_bytes).await
        }

        async fn open_staged(&self, _stored_name: &str) -> StorageResult<ContentReader> {
            Err(StorageError::ReadFailed("simulated read failure".to_string()))
        }

        async fn promote(&self, stored_name: &str) -> StorageResult<()> {
            self.0.promote(stored_name).await
        }

        async fn discard_staged(&self, stored_name: &str) -> StorageResult<()> {
            self.0.discard_staged(stored_name).await
        }

        async fn remove(&self, stored_name: &str) -> StorageResult<()> {
            self.0.remove(stored_name).await
        }

        async fn open(&self, stored_name: &str) -> StorageResult<ContentReader> {
            self.0.open(stored_name).await
        }

        async fn download_stream(&self, stored_name: &str) -> StorageResult<ByteStream> {
            self.0.download_stream(stored_name).await
        }

        async fn content_length(&self, stored_name: &str) -> StorageResult<u64> {
            self.0.content_length(stored_name).await
        }

        async fn list_stored_names(&self) -> StorageResult<Vec<String>> {
            self.0.list_stored_names().await
        }

        async fn list_staged(&self) -> StorageResult<Vec<StagedEntry>> {
            self.0.list_staged().await
        }

        async fn check_ready(&self) -> StorageResult<()> {
            self.0.check_ready().await
        }
    }

    #[tokio::test]
    async fn digest_failure_is_distinct_and_discards_staging() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(UnreadableStaging(LocalStorage::new(dir.path()).await.unwrap()));
        let catalog = Arc::new(MemoryCatalog::new());
        let service = IngestService::new(catalog.clone(), store.clone(), 1024);

        let err = service.ingest(upload("a.txt", b"a"), "anonymous").await.unwrap_err();
        assert!(matches!(err, IngestError::DigestCompute(_)));
        assert!(store.list_staged().await.unwrap().is_empty());
        assert!(store.list_stored_names().await.unwrap().is_empty());
        assert_eq!(catalog.count().await.unwrap(), 0);

        let err = AppError::from(err);
        assert_eq!(
            err.client_message(),
            "File could not be read back for fingerprinting; nothing was stored"
        );
        assert_eq!(err.suggested_action(), Some("Retry the upload"));
    }
}
