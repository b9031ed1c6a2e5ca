//! Hashdrop Storage Library
//!
//! The content directory: where uploaded bytes live, addressed by stored name.
//!
//! # Layout
//!
//! - `{content_dir}/{stored_name}`: promoted content, one flat directory.
//! - `{content_dir}/.staging/{stored_name}`: bytes still being written or digested.
//!
//! Stored names must pass [`hashdrop_core::is_safe_stored_name`]; anything else is
//! refused before a path is ever built.

pub mod factory;
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use factory::create_content_store;
pub use local::LocalStorage;
pub use traits::{ByteStream, ContentReader, ContentStore, StagedEntry, StorageError, StorageResult};
