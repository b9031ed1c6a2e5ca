use std::collections::HashSet;

use async_trait::async_trait;
use hashdrop_core::{
    models::{NewUpload, UploadRecord},
    AppError,
};
use sqlx::{PgPool, Postgres};

use super::catalog::Catalog;
use super::transaction::TransactionGuard;

const UPLOAD_COLUMNS: &str =
    "id, original_name, stored_name, digest, uploader, uploaded_at, size_bytes, content_type";

/// Repository for the `uploads` table
#[derive(Clone)]
pub struct UploadRepository {
    pool: PgPool,
}

impl UploadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Catalog for UploadRepository {
    #[tracing::instrument(
        skip(self, upload),
        fields(db.table = "uploads", db.operation = "insert", stored_name = %upload.stored_name)
    )]
    async fn insert(&self, upload: NewUpload) -> Result<UploadRecord, AppError> {
        upload.check_digest()?;
        let mut tx = TransactionGuard::begin(&self.pool).await?;

        let record = sqlx::query_as::<Postgres, UploadRecord>(&format!(
            r#"
            INSERT INTO uploads
                (original_name, stored_name, digest, uploader, uploaded_at, size_bytes, content_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            UPLOAD_COLUMNS
        ))
        .bind(NewUpload::strip_nul(&upload.original_name))
        .bind(&upload.stored_name)
        .bind(&upload.digest)
        .bind(&upload.uploader)
        .bind(upload.uploaded_at)
        .bind(upload.size_bytes)
        .bind(&upload.content_type)
        .fetch_one(tx.conn())
        .await?;

        tx.commit().await?;

        tracing::debug!(id = record.id, "Upload catalogued");

        Ok(record)
    }

    #[tracing::instrument(skip(self), fields(db.table = "uploads", db.operation = "select"))]
    async fn find_latest_by_name(
        &self,
        original_name: &str,
    ) -> Result<Option<UploadRecord>, AppError> {
        let record = sqlx::query_as::<Postgres, UploadRecord>(&format!(
            "SELECT {} FROM uploads WHERE original_name = $1 \
             ORDER BY uploaded_at DESC, id DESC LIMIT 1",
            UPLOAD_COLUMNS
        ))
        .bind(NewUpload::strip_nul(original_name))
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    #[tracing::instrument(skip(self), fields(db.table = "uploads", db.operation = "select", db.record_id = id))]
    async fn find_by_id(&self, id: i64) -> Result<Option<UploadRecord>, AppError> {
        let record = sqlx::query_as::<Postgres, UploadRecord>(&format!(
            "SELECT {} FROM uploads WHERE id = $1",
            UPLOAD_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    #[tracing::instrument(skip(self), fields(db.table = "uploads", db.operation = "select"))]
    async fn list_all(&self) -> Result<Vec<UploadRecord>, AppError> {
        let records = sqlx::query_as::<Postgres, UploadRecord>(&format!(
            "SELECT {} FROM uploads ORDER BY uploaded_at DESC, id DESC",
            UPLOAD_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    #[tracing::instrument(skip(self), fields(db.table = "uploads", db.operation = "select"))]
    async fn list_page(&self, limit: i64, offset: i64) -> Result<Vec<UploadRecord>, AppError> {
        let records = sqlx::query_as::<Postgres, UploadRecord>(&format!(
            "SELECT {} FROM uploads ORDER BY uploaded_at DESC, id DESC LIMIT $1 OFFSET $2",
            UPLOAD_COLUMNS
        ))
        .bind(limit.max(0))
        .bind(offset.max(0))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    #[tracing::instrument(skip(self), fields(db.table = "uploads", db.operation = "count"))]
    async fn count(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<Postgres, i64>("SELECT COUNT(*) FROM uploads")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    #[tracing::instrument(skip(self), fields(db.table = "uploads", db.operation = "select"))]
    async fn stored_names(&self) -> Result<HashSet<String>, AppError> {
        let names = sqlx::query_scalar::<Postgres, String>("SELECT stored_name FROM uploads")
            .fetch_all(&self.pool)
            .await?;
        Ok(names.into_iter().collect())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query_scalar::<Postgres, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}
