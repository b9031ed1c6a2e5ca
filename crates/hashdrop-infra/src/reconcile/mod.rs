//! Reconciliation of the content directory against the catalog.
//!
//! Stale staging files (left by crashed or aborted ingests) are deleted. Promoted
//! files without a catalog row, and catalog rows whose file is gone, are only
//! reported: either side may be the one an operator wants to keep.

use hashdrop_core::models::ReconcileReport;
use hashdrop_core::AppError;
use hashdrop_db::Catalog;
use hashdrop_storage::ContentStore;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::time::{interval, MissedTickBehavior};

#[derive(Clone)]
pub struct ReconcileService {
    catalog: Arc<dyn Catalog>,
    store: Arc<dyn ContentStore>,
    staging_max_age: Duration,
}

impl ReconcileService {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        store: Arc<dyn ContentStore>,
        staging_max_age: Duration,
    ) -> Self {
        Self {
            catalog,
            store,
            staging_max_age,
        }
    }

    /// Run the sweep every `every` until the runtime shuts down.
    pub fn start(self: Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately; skip it so startup is not slowed by a sweep.
            ticker.tick().await;

            loop {
                ticker.tick().await;

                tracing::info!("Starting scheduled reconciliation");

                match self.run_once().await {
                    Ok(report) if report.is_clean() => {
                        tracing::info!(
                            staging_removed = report.staging_removed.len(),
                            catalog_rows = report.catalog_rows,
                            "Reconciliation completed"
                        );
                    }
                    Ok(report) => {
                        tracing::warn!(
                            staging_removed = report.staging_removed.len(),
                            orphan_files = report.orphan_files.len(),
                            missing_files = report.missing_files.len(),
                            catalog_rows = report.catalog_rows,
                            "Reconciliation found inconsistencies"
                        );
                    }
                    Err(e) => tracing::error!(error = %e, "Reconciliation failed"),
                }
            }
        })
    }

    #[tracing::instrument(skip(self), fields(reconcile.operation = "sweep"))]
    pub async fn run_once(&self) -> Result<ReconcileReport, AppError> {
        let staging_removed = self.remove_stale_staging().await?;

        let catalogued = self.catalog.stored_names().await?;
        let on_disk = self.store.list_stored_names().await?;

        let mut orphan_files: Vec<String> = on_disk
            .iter()
            .filter(|name| !catalogued.contains(*name))
            .cloned()
            .collect();
        orphan_files.sort();

        let on_disk: std::collections::HashSet<String> = on_disk.into_iter().collect();
        let mut missing_files: Vec<String> = catalogued
            .into_iter()
            .filter(|name| !on_disk.contains(name))
            .collect();
        missing_files.sort();

        for name in &orphan_files {
            tracing::warn!(stored_name = %name, "Content file has no catalog row");
        }
        for name in &missing_files {
            tracing::error!(stored_name = %name, "Catalogued file is missing from content directory");
        }

        Ok(ReconcileReport {
            staging_removed,
            orphan_files,
            missing_files,
            catalog_rows: self.catalog.count().await?,
        })
    }

    async fn remove_stale_staging(&self) -> Result<Vec<String>, AppError> {
        let now = SystemTime::now();
        let mut removed = Vec::new();

        for entry in self.store.list_staged().await? {
            let age = now.duration_since(entry.modified).unwrap_or_default();
            if age < self.staging_max_age {
                continue;
            }
            match self.store.discard_staged(&entry.name).await {
                Ok(()) => {
                    tracing::info!(
                        stored_name = %entry.name,
                        age_secs = age.as_secs(),
                        "Removed stale staging file"
                    );
                    removed.push(entry.name);
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        stored_name = %entry.name,
                        "Failed to remove stale staging file"
                    );
                }
            }
        }

        removed.sort();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hashdrop_core::models::NewUpload;
    use hashdrop_core::{digest_bytes, stored_name_for};
    use hashdrop_db::MemoryCatalog;
    use hashdrop_storage::LocalStorage;
    use std::io::Cursor;

    async fn fixture(
        max_age: Duration,
    ) -> (tempfile::TempDir, Arc<MemoryCatalog>, Arc<LocalStorage>, ReconcileService) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalStorage::new(dir.path()).await.unwrap());
        let catalog = Arc::new(MemoryCatalog::new());
        let service = ReconcileService::new(catalog.clone(), store.clone(), max_age);
        (dir, catalog, store, service)
    }

    async fn ingest(catalog: &MemoryCatalog, store: &LocalStorage, name: &str, body: &[u8]) -> String {
        let stored = stored_name_for(name, Utc::now());
        store
            .stage(&stored, &mut Cursor::new(body.to_vec()), 1024)
            .await
            .unwrap();
        store.promote(&stored).await.unwrap();
        catalog
            .insert(NewUpload {
                original_name: name.to_string(),
                stored_name: stored.clone(),
                digest: digest_bytes(body),
                uploader: "anonymous".to_string(),
                uploaded_at: Utc::now(),
                size_bytes: body.len() as i64,
                content_type: "text/plain".to_string(),
            })
            .await
            .unwrap();
        stored
    }

    #[tokio::test]
    async fn consistent_store_is_clean() {
        let (_dir, catalog, store, service) = fixture(Duration::from_secs(3600)).await;
        ingest(&catalog, &store, "a.txt", b"a").await;

        let report = service.run_once().await.unwrap();
        assert!(report.is_clean());
        assert_eq!(report.catalog_rows, 1);
    }

    #[tokio::test]
    async fn orphans_and_missing_files_are_reported_not_deleted() {
        let (dir, catalog, store, service) = fixture(Duration::from_secs(3600)).await;
        let kept = ingest(&catalog, &store, "kept.txt", b"k").await;
        let gone = ingest(&catalog, &store, "gone.txt", b"g").await;
        std::fs::remove_file(dir.path().join(&gone)).unwrap();

        let orphan = stored_name_for("orphan.txt", Utc::now());
        store
            .stage(&orphan, &mut Cursor::new(b"o".to_vec()), 1024)
            .await
            .unwrap();
        store.promote(&orphan).await.unwrap();

        let report = service.run_once().await.unwrap();
        assert_eq!(report.orphan_files, vec![orphan.clone()]);
        assert_eq!(report.missing_files, vec![gone]);
        assert!(dir.path().join(&orphan).exists());
        assert!(dir.path().join(&kept).exists());
    }

    #[tokio::test]
    async fn stale_staging_is_removed_fresh_is_kept() {
        let (_dir, _catalog, store, service) = fixture(Duration::ZERO).await;
        let staged = stored_name_for("pending.bin", Utc::now());
        store
            .stage(&staged, &mut Cursor::new(b"p".to_vec()), 1024)
            .await
            .unwrap();

        let report = service.run_once().await.unwrap();
        assert_eq!(report.staging_removed, vec![staged]);
        assert!(store.list_staged().await.unwrap().is_empty());

        let (_dir, _catalog, store, service) = fixture(Duration::from_secs(3600)).await;
        let fresh = stored_name_for("fresh.bin", Utc::now());
        store
            .stage(&fresh, &mut Cursor::new(b"f".to_vec()), 1024)
            .await
            .unwrap();
        let report = service.run_once().await.unwrap();
        assert!(report.staging_removed.is_empty());
        assert_eq!(store.list_staged().await.unwrap().len(), 1);
    }
}
