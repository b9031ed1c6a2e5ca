//! Application state shared by all handlers.

use crate::auth::AuthState;
use crate::services::{AuditService, IngestService};
use hashdrop_db::Catalog;
use hashdrop_infra::ReconcileService;
use hashdrop_storage::ContentStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub ingest: Arc<IngestService>,
    pub audit: Arc<AuditService>,
    pub catalog: Arc<dyn Catalog>,
    pub store: Arc<dyn ContentStore>,
    pub reconcile: Arc<ReconcileService>,
    pub auth: Arc<AuthState>,
}
