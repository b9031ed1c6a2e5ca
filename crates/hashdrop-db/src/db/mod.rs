//! Catalog repositories
//
// Catalog trait shared by every backend
pub mod catalog;
//
// PostgreSQL repository over the `uploads` table
pub mod upload;
//
// Transaction utilities
pub mod transaction;
//
// Schema migrations
pub mod migrations;
//
// In-memory double for API tests
#[cfg(any(test, feature = "test-helpers"))]
pub mod memory;
