//! Database transaction utilities

use hashdrop_core::AppError;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

/// Wrapper that commits only when asked.
///
/// Dropping the guard without calling [`commit`](Self::commit) rolls the
/// transaction back, so an early `?` return never leaves a partial row behind.
///
/// ```ignore
/// let mut tx = TransactionGuard::begin(&pool).await?;
/// sqlx::query("INSERT INTO ...").execute(tx.conn()).await?;
/// tx.commit().await?;
/// ```
pub struct TransactionGuard<'a> {
    transaction: Transaction<'a, Postgres>,
}

impl<'a> TransactionGuard<'a> {
    pub async fn begin(pool: &'a PgPool) -> Result<Self, AppError> {
        let transaction = pool.begin().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to begin database transaction");
            AppError::from(e)
        })?;
        Ok(Self { transaction })
    }

    pub fn conn(&mut self) -> &mut PgConnection {
        &mut self.transaction
    }

    /// A failed commit reports [`AppError::CommitOutcomeUnknown`]: the server may
    /// have applied it before the reply was lost.
    pub async fn commit(self) -> Result<(), AppError> {
        self.transaction.commit().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to commit database transaction");
            AppError::CommitOutcomeUnknown(e.to_string())
        })
    }
}
