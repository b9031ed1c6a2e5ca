//! Hashdrop API Library
//!
//! HTTP handlers, the identity layer, the ingest and audit services, and application setup.

mod api_doc;
mod handlers;
mod utils;

pub mod auth;
pub mod error;
pub mod services;
pub mod setup;
pub mod state;

pub use error::HttpAppError;
pub use hashdrop_infra::ErrorResponse;
pub use services::{AuditService, IngestService};
pub use state::AppState;
