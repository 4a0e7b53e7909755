//! Capability traits for the engine's external collaborators.
//!
//! Rendering, HTTP and answer refinement are injected as trait objects so
//! the session loop can be driven against in-memory fakes. Every call takes
//! an explicit timeout; the engine additionally enforces it from the
//! outside with [`guarded`].

use crate::error::CapabilityError;
use crate::types::{FetchedFile, Snapshot};
use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

/// Headless page rendering: `render(url) -> {text, markup}`.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &str, timeout: Duration) -> Result<Snapshot, CapabilityError>;
}

/// Outbound HTTP.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` as JSON and decode the response body as JSON.
    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<Value, CapabilityError>;

    /// Download a linked file.
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedFile, CapabilityError>;
}

/// Last-resort external answer verification.
#[async_trait]
pub trait AnswerRefiner: Send + Sync {
    async fn refine(
        &self,
        question: &str,
        raw_answer: &str,
        timeout: Duration,
    ) -> Result<String, CapabilityError>;
}

/// Run a capability call under a hard timeout, turning panics into errors.
pub async fn guarded<T, F>(timeout: Duration, fut: F) -> Result<T, CapabilityError>
where
    F: Future<Output = Result<T, CapabilityError>>,
{
    match tokio::time::timeout(timeout, AssertUnwindSafe(fut).catch_unwind()).await {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => Err(CapabilityError::Panicked),
        Err(_) => Err(CapabilityError::Timeout(timeout.as_millis() as u64)),
    }
}
