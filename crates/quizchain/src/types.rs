//! Core data types shared by the cascade, the resolver and the session loop.

use crate::extract::StrategyKind;
use crate::normalize::Answer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Rendered state of one fetched page. Lives for a single round.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Raw page source.
    pub markup: String,
    /// Human-visible text, scripts and styles excluded.
    pub visible_text: String,
}

impl Snapshot {
    pub fn new(markup: impl Into<String>, visible_text: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
            visible_text: visible_text.into(),
        }
    }

    /// The degraded snapshot used when rendering fails.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.markup.is_empty() && self.visible_text.is_empty()
    }
}

/// A downloaded file referenced by a quiz page.
#[derive(Debug, Clone, Default)]
pub struct FetchedFile {
    pub bytes: Vec<u8>,
    /// `Content-Type` header, when the server sent one.
    pub content_type: Option<String>,
}

/// Body POSTed to the submission endpoint each round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub email: String,
    pub secret: String,
    /// The page fetched this round.
    pub url: String,
    pub answer: Answer,
}

/// One fetch/submit round. Immutable once appended to the trail.
#[derive(Debug, Clone, Serialize)]
pub struct Attempt {
    /// The page fetched this round.
    pub url: String,
    /// Resolved endpoint; `None` means resolution failed.
    pub submit_url: Option<String>,
    pub answer: Option<Answer>,
    /// Which cascade strategy produced the answer.
    pub strategy: Option<StrategyKind>,
    /// Raw JSON returned by the endpoint; `None` on transport failure.
    pub response: Option<Value>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl Attempt {
    /// The continuation URL carried by this attempt's response, if any.
    pub fn next_url(&self) -> Option<&str> {
        self.response.as_ref().and_then(continuation_url)
    }
}

/// Read the continuation field from a submission response.
///
/// Only a non-empty string counts; `null`, numbers and blank strings end the
/// chain. The `correct` verdict is never consulted.
pub fn continuation_url(response: &Value) -> Option<&str> {
    response
        .get("url")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|u| !u.is_empty())
}
