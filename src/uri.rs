//! Endpoint assembly for the contents REST API
//!
//! Paths arriving from callers are POSIX-style, slash-separated strings.
//! Each segment is percent-encoded independently and the segments rejoined,
//! so a segment containing a reserved character round-trips as data instead
//! of becoming a path separator.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left bare inside a path segment.
///
/// Matches the unreserved set of JavaScript's `encodeURIComponent`, which is
/// what the contents API convention grew up against.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a slash-separated path, one segment at a time
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Percent-encode a single path segment
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// Join URL parts with single slashes, skipping empty parts
///
/// Parts are expected to already be encoded; only the separators between
/// them are normalized.
pub fn join(base: &str, parts: &[&str]) -> String {
    let mut url = base.trim_end_matches('/').to_string();
    for part in parts {
        let part = part.trim_matches('/');
        if part.is_empty() {
            continue;
        }
        url.push('/');
        url.push_str(part);
    }
    url
}

/// Append query parameters to a URL, url-encoding names and values
pub fn with_query(url: &str, params: &[(String, String)]) -> String {
    if params.is_empty() {
        return url.to_string();
    }
    let query: String = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(name, value)| (name, value)))
        .finish();
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{query}")
}
