//! Hashdrop Infrastructure Library
//!
//! Shared pieces around the upload service:
//! - Middleware (request ID, security headers)
//! - Tracing subscriber setup
//! - Error response body
//! - Reconciliation of the content directory against the catalog

#[cfg(feature = "middleware")]
pub mod middleware;

#[cfg(feature = "observability-basic")]
pub mod telemetry;

pub mod error;

#[cfg(feature = "reconcile")]
pub mod reconcile;

// Re-export commonly used types
#[cfg(feature = "middleware")]
pub use middleware::{get_request_id, request_id_middleware, security_headers_middleware};

#[cfg(feature = "observability-basic")]
pub use telemetry::{init_telemetry, shutdown_telemetry};

pub use error::ErrorResponse;

#[cfg(feature = "reconcile")]
pub use reconcile::ReconcileService;
