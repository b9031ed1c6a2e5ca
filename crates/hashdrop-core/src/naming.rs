//! Stored-name policy.
//!
//! Client filenames are untrusted. They are reduced to a single safe path component
//! and prefixed with a nanosecond timestamp plus a random token, so the resulting
//! stored name is unique and always stays inside the content directory.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Upper bound for the sanitized part of a stored name, in bytes.
pub const MAX_SANITIZED_LEN: usize = 200;

/// Upper bound for a complete stored name, in bytes.
pub const MAX_STORED_NAME_LEN: usize = 255;

/// Substituted when sanitization leaves nothing usable.
pub const PLACEHOLDER_NAME: &str = "file";

const TOKEN_LEN: usize = 8;

fn is_safe_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_'
}

/// Strip a Windows drive prefix such as `C:`.
fn strip_drive_letter(name: &str) -> &str {
    let bytes = name.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        &name[2..]
    } else {
        name
    }
}

/// Truncate to `max` bytes, keeping a short extension when there is one.
fn truncate_keeping_extension(name: String, max: usize) -> String {
    if name.len() <= max {
        return name;
    }

    // Only ASCII survives sanitization, so byte slicing is safe here.
    match name.rfind('.') {
        Some(dot) if dot > 0 && name.len() - dot <= 16 => {
            let ext = &name[dot..];
            let stem = &name[..max - ext.len()];
            format!("{}{}", stem.trim_end_matches('.'), ext)
        }
        _ => name[..max].to_string(),
    }
}

/// Reduce an untrusted filename to a safe single path component.
///
/// Never fails: a name that sanitizes to nothing becomes [`PLACEHOLDER_NAME`].
pub fn sanitize_filename(original: &str) -> String {
    let last_component = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let without_drive = strip_drive_letter(last_component);

    let mut sanitized = String::with_capacity(without_drive.len());
    for c in without_drive.chars() {
        if c == '\0' || c.is_control() {
            continue;
        }
        let mapped = if is_safe_char(c) { c } else { '_' };
        // Collapse dot runs so ".." can never appear.
        if mapped == '.' && sanitized.ends_with('.') {
            continue;
        }
        sanitized.push(mapped);
    }

    let sanitized = sanitized.trim_start_matches('.').to_string();

    if sanitized.chars().all(|c| c == '_' || c == '.') {
        return PLACEHOLDER_NAME.to_string();
    }

    truncate_keeping_extension(sanitized, MAX_SANITIZED_LEN)
}

/// Derive the unique on-disk name for an upload received at `now`.
///
/// Format: `{YYYYMMDDTHHMMSSnnnnnnnnnZ}_{8 hex token}_{sanitized name}`.
pub fn stored_name_for(original: &str, now: DateTime<Utc>) -> String {
    let timestamp = now.format("%Y%m%dT%H%M%S%9fZ");
    let token = Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}",
        timestamp,
        &token[..TOKEN_LEN],
        sanitize_filename(original)
    )
}

/// True only for names this policy could have produced.
pub fn is_safe_stored_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_STORED_NAME_LEN
        && !name.starts_with('.')
        && !name.contains("..")
        && name.chars().all(is_safe_char)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn plain_names_are_kept() {
        assert_eq!(sanitize_filename("report.pdf"), "report.pdf");
        assert_eq!(sanitize_filename("my-file_1.jpg"), "my-file_1.jpg");
    }

    #[test]
    fn traversal_is_neutralized() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("..\\..\\windows\\win.ini"), "win.ini");
        assert_eq!(sanitize_filename("/absolute/path.txt"), "path.txt");
        assert_eq!(sanitize_filename("C:evil.exe"), "evil.exe");
        assert_eq!(sanitize_filename("C:\\temp\\evil.exe"), "evil.exe");
        assert_eq!(sanitize_filename("a..b.txt"), "a.b.txt");
    }

    #[test]
    fn unsafe_characters_are_replaced() {
        assert_eq!(sanitize_filename("hello world?.txt"), "hello_world_.txt");
        assert_eq!(sanitize_filename("nul\0byte.txt"), "nulbyte.txt");
        assert_eq!(sanitize_filename("résumé.pdf"), "r_sum_.pdf");
        assert_eq!(sanitize_filename(".hidden"), "hidden");
    }

    #[test]
    fn degenerate_names_get_placeholder() {
        assert_eq!(sanitize_filename(""), PLACEHOLDER_NAME);
        assert_eq!(sanitize_filename(".."), PLACEHOLDER_NAME);
        assert_eq!(sanitize_filename("../"), PLACEHOLDER_NAME);
        assert_eq!(sanitize_filename("???"), PLACEHOLDER_NAME);
        assert_eq!(sanitize_filename("\0\0"), PLACEHOLDER_NAME);
    }

    #[test]
    fn long_names_are_truncated_keeping_extension() {
        let long = format!("{}.tar.gz", "a".repeat(400));
        let sanitized = sanitize_filename(&long);
        assert_eq!(sanitized.len(), MAX_SANITIZED_LEN);
        assert!(sanitized.ends_with(".gz"));
    }

    #[test]
    fn stored_names_are_unique_for_same_instant() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        let first = stored_name_for("report.pdf", now);
        let second = stored_name_for("report.pdf", now);

        assert_ne!(first, second);
        assert!(first.starts_with("20261019T120000000000000Z_"));
        assert!(first.ends_with("_report.pdf"));
        assert!(is_safe_stored_name(&first));
        assert!(is_safe_stored_name(&second));
    }

    #[test]
    fn stored_name_for_traversal_is_safe() {
        let name = stored_name_for("../../etc/passwd", Utc::now());
        assert!(name.ends_with("_passwd"));
        assert!(is_safe_stored_name(&name));
        assert!(name.len() <= MAX_STORED_NAME_LEN);
    }

    #[test]
    fn safe_name_check_rejects_escapes() {
        assert!(!is_safe_stored_name(""));
        assert!(!is_safe_stored_name(".."));
        assert!(!is_safe_stored_name("../etc/passwd"));
        assert!(!is_safe_stored_name("a/b"));
        assert!(!is_safe_stored_name(".staging"));
        assert!(!is_safe_stored_name(&"a".repeat(300)));
        assert!(is_safe_stored_name("20261019T120000000000000Z_abcd1234_x.txt"));
    }
}
