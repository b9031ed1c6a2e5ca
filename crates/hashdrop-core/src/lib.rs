//! Hashdrop Core Library
//!
//! Domain models, error types, configuration, and the two pure building blocks of
//! the upload pipeline: the SHA-256 digest engine and the stored-name policy.

pub mod config;
pub mod constants;
pub mod digest;
pub mod error;
pub mod models;
pub mod naming;

// Re-export commonly used types
pub use config::{Config, LogFormat};
pub use digest::{
    digest_bytes, digest_file, digest_reader, is_valid_digest, Sha256Digest, EMPTY_SHA256,
};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use naming::{is_safe_stored_name, sanitize_filename, stored_name_for};
