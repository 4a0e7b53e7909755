//! The session loop.
//!
//! One session walks the quiz chain from a start URL:
//!
//! ```text
//! FETCHING -> EXTRACTING -> SUBMITTING -> CONTINUING -> FETCHING ...
//!                                      \-> DONE | FAILED
//! ```
//!
//! The deadline is only checked on entry to `FETCHING`; a round already in
//! flight runs to completion even if it crosses the deadline. Render and
//! extraction problems are absorbed. Only the deadline and a failed
//! submission end a session early.

use crate::capability::{guarded, AnswerRefiner, PageRenderer, Transport};
use crate::error::SolveError;
use crate::extract::{Cascade, Extraction, PageContext};
use crate::normalize::Answer;
use crate::resolver;
use crate::types::{continuation_url, Attempt, Snapshot, SubmissionPayload};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, info_span, warn, Instrument};

/// Default wall-clock budget for one session.
pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_secs(170);

/// Engine settings, built once per process and handed to the [`Solver`].
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub time_budget: Duration,
    pub render_timeout: Duration,
    pub submit_timeout: Duration,
    pub download_timeout: Duration,
    pub refine_timeout: Duration,
    /// Hard cap on rounds, for endpoints that keep pointing back at
    /// themselves.
    pub max_rounds: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            time_budget: DEFAULT_TIME_BUDGET,
            render_timeout: Duration::from_secs(30),
            submit_timeout: Duration::from_secs(30),
            download_timeout: Duration::from_secs(30),
            refine_timeout: Duration::from_secs(20),
            max_rounds: 64,
        }
    }
}

impl EngineConfig {
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = budget;
        self
    }

    pub fn with_render_timeout(mut self, timeout: Duration) -> Self {
        self.render_timeout = timeout;
        self
    }

    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = timeout;
        self
    }

    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    pub fn with_refine_timeout(mut self, timeout: Duration) -> Self {
        self.refine_timeout = timeout;
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }
}

/// Everything a finished session has to say.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub session_id: String,
    pub start_url: String,
    pub trail: Vec<Attempt>,
    /// The last submission response, or the error that ended the session.
    pub outcome: Result<Value, SolveError>,
    pub elapsed_ms: u64,
}

impl SessionReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Render the report as the JSON object returned to callers.
    pub fn to_json(&self) -> Value {
        let attempts = serde_json::to_value(&self.trail).unwrap_or(Value::Array(Vec::new()));
        match &self.outcome {
            Ok(result) => serde_json::json!({
                "status": "completed",
                "session_id": self.session_id,
                "start_url": self.start_url,
                "result": result,
                "attempts": attempts,
                "elapsed_ms": self.elapsed_ms,
            }),
            Err(e) => serde_json::json!({
                "status": "failed",
                "session_id": self.session_id,
                "start_url": self.start_url,
                "error": e.kind(),
                "detail": e.detail(),
                "attempts": attempts,
                "elapsed_ms": self.elapsed_ms,
            }),
        }
    }
}

/// State of the loop between steps.
enum State {
    Fetching,
    Extracting {
        page: PageContext,
    },
    Submitting {
        page: PageContext,
        submit_url: Option<String>,
        extraction: Extraction,
    },
    Continuing {
        next_url: String,
    },
    Done(Value),
    Failed(SolveError),
}

/// One resolution run. Owns its trail; attempts are never modified once
/// pushed.
struct Session {
    start_url: String,
    deadline: Instant,
    current_url: String,
    trail: Vec<Attempt>,
    terminal_result: Option<Result<Value, SolveError>>,
}

impl Session {
    fn new(start_url: &str, budget: Duration) -> Self {
        Self {
            start_url: start_url.to_string(),
            deadline: Instant::now() + budget,
            current_url: start_url.to_string(),
            trail: Vec::new(),
            terminal_result: None,
        }
    }

    fn finish(&mut self, result: Result<Value, SolveError>) {
        debug_assert!(self.terminal_result.is_none(), "terminal result set twice");
        self.terminal_result = Some(result);
    }
}

/// Drives sessions against injected capabilities.
#[derive(Clone)]
pub struct Solver {
    renderer: Arc<dyn PageRenderer>,
    transport: Arc<dyn Transport>,
    cascade: Cascade,
    config: EngineConfig,
}

impl Solver {
    pub fn new(
        renderer: Arc<dyn PageRenderer>,
        transport: Arc<dyn Transport>,
        config: EngineConfig,
    ) -> Self {
        let cascade = Cascade::new(Arc::clone(&transport))
            .with_timeouts(config.download_timeout, config.refine_timeout);
        Self {
            renderer,
            transport,
            cascade,
            config,
        }
    }

    /// Enable the external refiner as the cascade's last resort.
    pub fn with_refiner(mut self, refiner: Arc<dyn AnswerRefiner>) -> Self {
        self.cascade = self.cascade.with_refiner(refiner);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Solve the chain starting at `start_url`. Never panics, never errors:
    /// failures are reported in [`SessionReport::outcome`].
    pub async fn solve(&self, email: &str, secret: &str, start_url: &str) -> SessionReport {
        let session_id = uuid::Uuid::new_v4().to_string();
        let span = info_span!("session", id = %session_id, start_url = %start_url);
        self.run(session_id, email, secret, start_url)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        session_id: String,
        email: &str,
        secret: &str,
        start_url: &str,
    ) -> SessionReport {
        let started = Instant::now();
        let mut session = Session::new(start_url, self.config.time_budget);
        let mut round_started = Utc::now();
        let mut round_clock = Instant::now();
        let mut state = State::Fetching;

        info!(budget_s = self.config.time_budget.as_secs(), "session started");

        loop {
            state = match state {
                State::Fetching => {
                    if Instant::now() > session.deadline {
                        State::Failed(SolveError::TimeLimitExceeded)
                    } else if session.trail.len() >= self.config.max_rounds {
                        State::Failed(SolveError::RoundLimitExceeded(self.config.max_rounds))
                    } else {
                        round_started = Utc::now();
                        round_clock = Instant::now();
                        let snapshot = self.fetch(&session.current_url).await;
                        State::Extracting {
                            page: PageContext::new(session.current_url.clone(), snapshot),
                        }
                    }
                }
                State::Extracting { page } => {
                    let submit_url = resolver::resolve_with_payload(
                        &page.snapshot,
                        page.decoded.as_deref(),
                        &page.url,
                    );
                    let extraction = self.cascade.run(&page).await;
                    State::Submitting {
                        page,
                        submit_url,
                        extraction,
                    }
                }
                State::Submitting {
                    page,
                    submit_url,
                    extraction,
                } => {
                    let result = match &submit_url {
                        Some(target) => {
                            let payload = SubmissionPayload {
                                email: email.to_string(),
                                secret: secret.to_string(),
                                url: page.url.clone(),
                                answer: extraction.answer.clone(),
                            };
                            self.submit(target, &payload).await
                        }
                        None => Err(SolveError::SubmitRequestFailed(format!(
                            "no submit endpoint could be derived from {}",
                            page.url
                        ))),
                    };

                    let attempt = Attempt {
                        url: page.url.clone(),
                        submit_url: submit_url.clone(),
                        answer: Some(extraction.answer.clone()),
                        strategy: Some(extraction.strategy),
                        response: result.as_ref().ok().cloned(),
                        started_at: round_started,
                        duration_ms: round_clock.elapsed().as_millis() as u64,
                    };
                    info!(
                        round = session.trail.len() + 1,
                        url = %attempt.url,
                        submit_url = ?attempt.submit_url,
                        strategy = ?extraction.strategy,
                        answer = %log_preview(&extraction.answer),
                        "round finished"
                    );
                    session.trail.push(attempt);

                    match result {
                        Ok(response) => match continuation_url(&response) {
                            Some(next) => State::Continuing {
                                next_url: join_url(&page.url, next),
                            },
                            None => State::Done(response),
                        },
                        Err(e) => State::Failed(e),
                    }
                }
                State::Continuing { next_url } => {
                    info!(next_url = %next_url, "following continuation");
                    session.current_url = next_url;
                    State::Fetching
                }
                State::Done(response) => {
                    info!(rounds = session.trail.len(), "session completed");
                    session.finish(Ok(response));
                    break;
                }
                State::Failed(e) => {
                    warn!(rounds = session.trail.len(), error = %e, "session failed");
                    session.finish(Err(e));
                    break;
                }
            };
        }

        SessionReport {
            session_id,
            start_url: session.start_url,
            trail: session.trail,
            outcome: session
                .terminal_result
                .unwrap_or(Err(SolveError::TimeLimitExceeded)),
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Render a page; any failure degrades to an empty snapshot.
    async fn fetch(&self, url: &str) -> Snapshot {
        let timeout = self.config.render_timeout;
        match guarded(timeout, self.renderer.render(url, timeout)).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(url = %url, error = %e, "render failed, continuing with empty snapshot");
                Snapshot::empty()
            }
        }
    }

    async fn submit(&self, target: &str, payload: &SubmissionPayload) -> Result<Value, SolveError> {
        let body = serde_json::to_value(payload)
            .map_err(|e| SolveError::SubmitRequestFailed(format!("payload encoding: {e}")))?;
        let timeout = self.config.submit_timeout;
        guarded(timeout, self.transport.post_json(target, &body, timeout))
            .await
            .map_err(|e| SolveError::SubmitRequestFailed(e.to_string()))
    }
}

/// Longest answer rendering written to the round log.
const LOG_PREVIEW_CHARS: usize = 80;

/// Answer as shown in logs; image data URIs run to megabytes.
fn log_preview(answer: &Answer) -> String {
    let full = answer.to_string();
    match full.char_indices().nth(LOG_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}… ({} chars)", &full[..cut], full.chars().count()),
        None => full,
    }
}

/// Resolve a continuation against the page it came from. Absolute URLs are
/// taken as-is.
fn join_url(base: &str, next: &str) -> String {
    match url::Url::parse(base).and_then(|b| b.join(next)) {
        Ok(joined) => joined.to_string(),
        Err(_) => next.to_string(),
    }
}
