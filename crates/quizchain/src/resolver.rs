//! Submission target resolution: where does the answer get POSTed?
//!
//! Search order:
//! 1. absolute URL in the visible text containing "submit"
//! 2. the same search over the raw markup
//! 3. the same search over the decoded payload, if the page carries one
//! 4. `{scheme}://{host}/submit` built from the page URL
//!
//! Step 4 always succeeds for a URL with a host, so a missing endpoint is
//! never the failure mode; a wrong one surfaces at submission time.

use crate::extract::payload;
use crate::types::Snapshot;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

fn absolute_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"https?://[^\s"'`<>()\[\]{}\\]+"#).expect("valid regex"))
}

/// Resolve the submission endpoint for a page.
pub fn resolve_submit_url(snapshot: &Snapshot, base_url: &str) -> Option<String> {
    let decoded = payload::decode_payload(&snapshot.markup);
    resolve_with_payload(snapshot, decoded.as_deref(), base_url)
}

/// Like [`resolve_submit_url`] but reuses an already-decoded payload.
pub fn resolve_with_payload(
    snapshot: &Snapshot,
    decoded: Option<&str>,
    base_url: &str,
) -> Option<String> {
    let sources = [
        ("visible_text", Some(snapshot.visible_text.as_str())),
        ("markup", Some(snapshot.markup.as_str())),
        ("payload", decoded),
    ];
    for (label, text) in sources {
        if let Some(found) = text.and_then(find_submit_literal) {
            debug!(source = label, url = %found, "submit endpoint found");
            return Some(found);
        }
    }
    let fallback = fallback_submit_url(base_url);
    debug!(url = ?fallback, "using fallback submit endpoint");
    fallback
}

/// First absolute URL in `text` whose text contains "submit" (any case).
pub fn find_submit_literal(text: &str) -> Option<String> {
    absolute_url_re()
        .find_iter(text)
        .map(|m| trim_trailing_punctuation(m.as_str()))
        .find(|candidate| candidate.to_ascii_lowercase().contains("submit"))
        .map(str::to_string)
}

/// `{scheme}://{host}[:port]/submit` for the given page URL.
pub fn fallback_submit_url(base_url: &str) -> Option<String> {
    let parsed = url::Url::parse(base_url).ok()?;
    let host = parsed.host_str()?;
    let origin = match parsed.port() {
        Some(port) => format!("{}://{host}:{port}", parsed.scheme()),
        None => format!("{}://{host}", parsed.scheme()),
    };
    Some(format!("{origin}/submit"))
}

/// All absolute URLs found in `text`, in order of appearance.
pub fn absolute_urls(text: &str) -> Vec<String> {
    absolute_url_re()
        .find_iter(text)
        .map(|m| trim_trailing_punctuation(m.as_str()).to_string())
        .collect()
}

fn trim_trailing_punctuation(url: &str) -> &str {
    url.trim_end_matches(['.', ',', ';', ':', '!', '?'])
}
