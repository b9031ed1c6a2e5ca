//! `Content-Disposition` for downloads.
//!
//! The original filename is untrusted and may be any Unicode. It is sent twice: a
//! printable-ASCII `filename` for old clients and an RFC 5987 `filename*` carrying the
//! exact UTF-8 name.

use axum::http::HeaderValue;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// RFC 5987 `attr-char` minus alphanumerics; everything else is percent-encoded.
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

const FALLBACK_NAME: &str = "download";

fn ascii_fallback(name: &str) -> String {
    // Only the last path component; directory parts are meaningless to the client.
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() || c == ' ') && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches(|c| c == '_' || c == ' ' || c == '.').is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        cleaned
    }
}

pub fn attachment(original_name: &str) -> HeaderValue {
    let value = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii_fallback(original_name),
        utf8_percent_encode(original_name, ATTR_CHAR)
    );
    HeaderValue::from_str(&value)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
