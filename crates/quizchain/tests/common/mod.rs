//! In-memory capabilities shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use quizchain::{AnswerRefiner, CapabilityError, FetchedFile, PageRenderer, Snapshot, Transport};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// Serves canned snapshots; unknown URLs fail like a dead navigation.
#[derive(Default)]
pub struct FakeRenderer {
    pages: HashMap<String, Snapshot>,
    delay: Option<Duration>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, markup: &str, text: &str) -> Self {
        self.pages
            .insert(url.to_string(), Snapshot::new(markup, text));
        self
    }

    /// Every render takes this long (use with a paused clock).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl PageRenderer for FakeRenderer {
    async fn render(&self, url: &str, _timeout: Duration) -> Result<Snapshot, CapabilityError> {
        self.calls.lock().unwrap().push(url.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| CapabilityError::Navigation(format!("no page at {url}")))
    }
}

/// Records submissions and replays queued responses.
#[derive(Default)]
pub struct FakeTransport {
    responses: Mutex<VecDeque<Result<Value, CapabilityError>>>,
    files: HashMap<String, FetchedFile>,
    pub posts: Mutex<Vec<(String, Value)>>,
    pub fetches: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, response: Value) -> Self {
        self.responses.lock().unwrap().push_back(Ok(response));
        self
    }

    pub fn fail(self, error: CapabilityError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn file(mut self, url: &str, bytes: &[u8], content_type: Option<&str>) -> Self {
        self.files.insert(
            url.to_string(),
            FetchedFile {
                bytes: bytes.to_vec(),
                content_type: content_type.map(str::to_string),
            },
        );
        self
    }

    pub fn posts(&self) -> Vec<(String, Value)> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        _timeout: Duration,
    ) -> Result<Value, CapabilityError> {
        self.posts
            .lock()
            .unwrap()
            .push((url.to_string(), body.clone()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(serde_json::json!({"correct": true})))
    }

    async fn fetch(&self, url: &str, _timeout: Duration) -> Result<FetchedFile, CapabilityError> {
        self.fetches.lock().unwrap().push(url.to_string());
        self.files.get(url).cloned().ok_or(CapabilityError::Status {
            status: 404,
            url: url.to_string(),
        })
    }
}

/// Refiner with a fixed reply.
pub struct FakeRefiner {
    reply: Result<String, CapabilityError>,
    pub seen: Mutex<Vec<(String, String)>>,
}

impl FakeRefiner {
    pub fn ok(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: Err(CapabilityError::Unavailable("quota exhausted".into())),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AnswerRefiner for FakeRefiner {
    async fn refine(
        &self,
        question: &str,
        raw_answer: &str,
        _timeout: Duration,
    ) -> Result<String, CapabilityError> {
        self.seen
            .lock()
            .unwrap()
            .push((question.to_string(), raw_answer.to_string()));
        self.reply.clone()
    }
}
