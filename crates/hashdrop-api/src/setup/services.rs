//! Service initialization and application state setup

use crate::auth::AuthState;
use crate::services::{AuditService, IngestService};
use crate::state::AppState;
use hashdrop_core::Config;
use hashdrop_db::Catalog;
use hashdrop_infra::ReconcileService;
use hashdrop_storage::ContentStore;
use std::sync::Arc;
use std::time::Duration;

/// Wire the services on top of a catalog and a content store.
///
/// The catalog is passed in so tests can use `MemoryCatalog` in place of PostgreSQL.
pub fn initialize_services(
    config: &Config,
    catalog: Arc<dyn Catalog>,
    store: Arc<dyn ContentStore>,
) -> Arc<AppState> {
    let ingest = IngestService::new(
        catalog.clone(),
        store.clone(),
        config.max_file_size_bytes() as u64,
    );
    let audit = AuditService::new(catalog.clone(), store.clone());
    let reconcile = ReconcileService::new(
        catalog.clone(),
        store.clone(),
        Duration::from_secs(config.staging_max_age_secs()),
    );

    tracing::info!(
        max_file_size_bytes = config.max_file_size_bytes(),
        anonymous_uploader = %config.anonymous_uploader(),
        "Services initialized"
    );

    Arc::new(AppState {
        ingest: Arc::new(ingest),
        audit: Arc::new(audit),
        catalog,
        store,
        reconcile: Arc::new(reconcile),
        auth: Arc::new(AuthState {
            admin_api_key: config.admin_api_key().to_string(),
            anonymous_uploader: config.anonymous_uploader().to_string(),
        }),
    })
}
