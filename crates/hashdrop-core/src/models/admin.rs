use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::UploadRecord;

pub const DEFAULT_PAGE_LIMIT: i64 = 50;
pub const MAX_PAGE_LIMIT: i64 = 500;

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadListQuery {
    #[validate(range(min = 1, max = 500))]
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_LIMIT
}

impl Default for UploadListQuery {
    fn default() -> Self {
        UploadListQuery {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadListResponse {
    pub items: Vec<UploadRecord>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Result of comparing the content directory against the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReconcileReport {
    /// Stale staging files that were deleted.
    pub staging_removed: Vec<String>,
    /// Content files with no catalog row. Reported, never deleted.
    pub orphan_files: Vec<String>,
    /// Catalog rows whose stored file is gone.
    pub missing_files: Vec<String>,
    pub catalog_rows: i64,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.orphan_files.is_empty() && self.missing_files.is_empty()
    }
}
