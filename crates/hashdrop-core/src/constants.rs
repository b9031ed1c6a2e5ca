/// Identity recorded for uploads made without an authenticated session
/// (overridable with `ANONYMOUS_UPLOADER`).
pub const DEFAULT_ANONYMOUS_UPLOADER: &str = "anonymous";

/// Identity recorded for uploads authenticated with the admin token.
pub const ADMIN_IDENTITY: &str = "admin";

/// Multipart field that carries the uploaded file.
pub const FILE_FIELD: &str = "file";

/// Longest client-supplied filename accepted by the ingest pipeline, in bytes.
pub const MAX_ORIGINAL_NAME_LEN: usize = 1024;

/// Subdirectory of the content directory where bytes land before promotion.
pub const STAGING_DIR: &str = ".staging";

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
