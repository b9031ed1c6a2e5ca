use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UploadRecord;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditReport {
    pub id: i64,
    pub filename: String,
    pub sha256: String,
    pub uploaded_at: DateTime<Utc>,
}

impl From<UploadRecord> for AuditReport {
    fn from(record: UploadRecord) -> Self {
        AuditReport {
            id: record.id,
            filename: record.original_name,
            sha256: record.digest,
            uploaded_at: record.uploaded_at,
        }
    }
}

/// Recorded digest compared against a fresh digest of the stored bytes.
///
/// `actual` is `None` when the stored file no longer exists.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VerifyReport {
    pub id: i64,
    pub filename: String,
    pub recorded: String,
    pub actual: Option<String>,
    pub intact: bool,
}

impl VerifyReport {
    pub fn new(record: &UploadRecord, actual: Option<String>) -> Self {
        VerifyReport {
            id: record.id,
            filename: record.original_name.clone(),
            intact: actual.as_deref() == Some(record.digest.as_str()),
            recorded: record.digest.clone(),
            actual,
        }
    }
}

/// Original name to latest digest.
pub type IntegrityMap = BTreeMap<String, String>;

/// Fold newest-first records into the latest digest per name.
pub fn integrity_map<'a, I>(records_newest_first: I) -> IntegrityMap
where
    I: IntoIterator<Item = &'a UploadRecord>,
{
    let mut map = IntegrityMap::new();
    for record in records_newest_first {
        map.entry(record.original_name.clone())
            .or_insert_with(|| record.digest.clone());
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(id: i64, name: &str, digest: &str, age_secs: i64) -> UploadRecord {
        UploadRecord {
            id,
            original_name: name.to_string(),
            stored_name: format!("stored_{}", id),
            digest: digest.to_string(),
            uploader: "anonymous".to_string(),
            uploaded_at: Utc::now() - Duration::seconds(age_secs),
            size_bytes: 1,
            content_type: "text/plain".to_string(),
        }
    }

    #[test]
    fn integrity_map_keeps_newest_digest_per_name() {
        let records = vec![
            record(3, "report.pdf", "ccc", 0),
            record(2, "notes.txt", "bbb", 10),
            record(1, "report.pdf", "aaa", 20),
        ];
        let map = integrity_map(&records);
        assert_eq!(map.len(), 2);
        assert_eq!(map["report.pdf"], "ccc");
        assert_eq!(map["notes.txt"], "bbb");
    }

    #[test]
    fn verify_report_flags_mismatch() {
        let rec = record(1, "a.txt", "aaa", 0);
        assert!(VerifyReport::new(&rec, Some("aaa".to_string())).intact);
        let tampered = VerifyReport::new(&rec, Some("bbb".to_string()));
        assert!(!tampered.intact);
        assert_eq!(tampered.recorded, "aaa");
        assert_eq!(tampered.actual.as_deref(), Some("bbb"));
    }

    #[test]
    fn missing_file_is_not_intact() {
        let rec = record(1, "a.txt", "aaa", 0);
        let report = VerifyReport::new(&rec, None);
        assert!(!report.intact);
        assert!(report.actual.is_none());
    }
}
