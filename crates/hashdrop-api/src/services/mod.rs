pub mod audit;
pub mod ingest;

pub use audit::{AuditService, Retrieval};
pub use ingest::{BodyLimitExceeded, FilePart, IncomingUpload, IngestError, IngestService};
