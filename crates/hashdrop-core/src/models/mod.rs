//! Data models for the upload service
//!
//! Catalog rows, pipeline inputs, and the JSON bodies returned by the HTTP surface.

mod admin;
mod audit;
mod upload;

pub use admin::*;
pub use audit::*;
pub use upload::*;
