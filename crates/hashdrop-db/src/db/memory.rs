//! In-memory catalog
//!
//! Same ordering and uniqueness rules as the PostgreSQL repository, kept in a
//! mutex-guarded `Vec`. Used by API tests that do not start a database.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use hashdrop_core::{
    models::{NewUpload, UploadRecord},
    AppError,
};

use super::catalog::Catalog;

#[derive(Default)]
pub struct MemoryCatalog {
    rows: Mutex<Vec<UploadRecord>>,
    fail_inserts: AtomicBool,
    lose_commits: AtomicBool,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `insert` fail with a database-style error.
    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Make every following `insert` store its row but report an unknown commit outcome.
    pub fn lose_commits(&self, lose: bool) {
        self.lose_commits.store(lose, Ordering::SeqCst);
    }

    fn rows(&self) -> Result<std::sync::MutexGuard<'_, Vec<UploadRecord>>, AppError> {
        self.rows
            .lock()
            .map_err(|_| AppError::Internal("catalog lock poisoned".to_string()))
    }

    fn newest_first(rows: &[UploadRecord]) -> Vec<UploadRecord> {
        let mut sorted = rows.to_vec();
        sorted.sort_by(|a, b| {
            b.uploaded_at
                .cmp(&a.uploaded_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        sorted
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn insert(&self, upload: NewUpload) -> Result<UploadRecord, AppError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(AppError::Internal("catalog unavailable".to_string()));
        }
        upload.check_digest()?;

        let mut rows = self.rows()?;
        if rows.iter().any(|r| r.stored_name == upload.stored_name) {
            return Err(AppError::Conflict(format!(
                "stored name {} already catalogued",
                upload.stored_name
            )));
        }

        let id = rows.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        let mut record = upload.into_record(id);
        record.original_name = NewUpload::strip_nul(&record.original_name);
        rows.push(record.clone());

        if self.lose_commits.load(Ordering::SeqCst) {
            return Err(AppError::CommitOutcomeUnknown("connection lost".to_string()));
        }
        Ok(record)
    }

    async fn find_latest_by_name(
        &self,
        original_name: &str,
    ) -> Result<Option<UploadRecord>, AppError> {
        let original_name = NewUpload::strip_nul(original_name);
        let rows = self.rows()?;
        Ok(Self::newest_first(&rows)
            .into_iter()
            .find(|r| r.original_name == original_name))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UploadRecord>, AppError> {
        let rows = self.rows()?;
        Ok(rows.iter().find(|r| r.id == id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<UploadRecord>, AppError> {
        let rows = self.rows()?;
        Ok(Self::newest_first(&rows))
    }

    async fn list_page(&self, limit: i64, offset: i64) -> Result<Vec<UploadRecord>, AppError> {
        let rows = self.rows()?;
        Ok(Self::newest_first(&rows)
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(self.rows()?.len() as i64)
    }

    async fn stored_names(&self) -> Result<HashSet<String>, AppError> {
        Ok(self.rows()?.iter().map(|r| r.stored_name.clone()).collect())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
