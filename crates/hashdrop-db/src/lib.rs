//! Hashdrop catalog
//!
//! The durable record of every upload: which client name maps to which stored file,
//! and the digest recorded when it was ingested.

pub mod db;

pub use db::catalog::Catalog;
#[cfg(any(test, feature = "test-helpers"))]
pub use db::memory::MemoryCatalog;
pub use db::migrations::run_migrations;
pub use db::transaction::TransactionGuard;
pub use db::upload::UploadRepository;
