//! HTTP error response body
//!
//! `IntoResponse` for `AppError` lives in hashdrop-api (orphan rule); this is only the
//! JSON shape, shared so the OpenAPI document can reference it.

use serde::Serialize;
use utoipa::ToSchema;

/// Standard error response format for HTTP APIs
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable code, e.g. `DIGEST_COMPUTE_ERROR`.
    pub code: String,
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}
