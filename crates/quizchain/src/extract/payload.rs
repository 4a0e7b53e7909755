//! Embedded base64 payloads.
//!
//! Quiz pages often hide the real question behind a client-side decode such
//! as ``atob(`...`)`` or `decodePayload("...")`. The decoded text is a second
//! place to look for endpoints, file links and explicit answers.

use super::{literal, table};
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::debug;

fn decode_call_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\b(?:atob|[\w$.]*decode[\w$]*)\s*\(\s*[`'"]([A-Za-z0-9+/=_\-\s]+)[`'"]\s*\)"#)
            .expect("valid regex")
    })
}

/// Decode every embedded payload in `markup`.
///
/// Multiple payloads are joined with newlines. Literals that are not valid
/// base64 or not UTF-8 are skipped; `None` means nothing decoded.
pub fn decode_payload(markup: &str) -> Option<String> {
    let decoded: Vec<String> = decode_call_re()
        .captures_iter(markup)
        .filter_map(|cap| cap.get(1))
        .filter_map(|m| decode_literal(m.as_str()))
        .collect();

    if decoded.is_empty() {
        None
    } else {
        debug!(payloads = decoded.len(), "decoded embedded payload");
        Some(decoded.join("\n"))
    }
}

/// Decode a single base64 literal, tolerating whitespace, missing padding
/// and the URL-safe alphabet.
pub fn decode_literal(literal: &str) -> Option<String> {
    let compact: String = literal.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }
    let bytes = STANDARD
        .decode(&compact)
        .or_else(|_| STANDARD_NO_PAD.decode(&compact))
        .or_else(|_| URL_SAFE.decode(&compact))
        .or_else(|_| URL_SAFE_NO_PAD.decode(&compact))
        .ok()?;
    String::from_utf8(bytes).ok()
}

/// Candidate answer carried by the decoded payload itself: an explicit
/// "answer is" phrase, or a table embedded in the decoded markup.
pub fn candidate(decoded: &str) -> Option<Value> {
    if let Some(value) = literal::answer_phrase(decoded) {
        return Some(value);
    }
    if decoded.to_ascii_lowercase().contains("<table") {
        return table::aggregate_markup(decoded, decoded);
    }
    None
}
