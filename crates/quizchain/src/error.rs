//! Error types for the engine and its injected capabilities.

/// Terminal failure of a session. Everything else is absorbed.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    /// The deadline was crossed at a round boundary.
    #[error("time limit exceeded")]
    TimeLimitExceeded,

    /// Posting the answer failed or the response body was not JSON.
    #[error("submit request failed: {0}")]
    SubmitRequestFailed(String),

    /// The chain kept continuing past the configured round cap.
    #[error("round limit of {0} exceeded")]
    RoundLimitExceeded(usize),
}

impl SolveError {
    /// Stable snake_case identifier reported to callers.
    pub fn kind(&self) -> &'static str {
        match self {
            SolveError::TimeLimitExceeded => "time_limit_exceeded",
            SolveError::SubmitRequestFailed(_) => "submit_request_failed",
            SolveError::RoundLimitExceeded(_) => "round_limit_exceeded",
        }
    }

    /// Extra detail attached to the error, if any.
    pub fn detail(&self) -> Option<String> {
        match self {
            SolveError::TimeLimitExceeded => None,
            SolveError::SubmitRequestFailed(detail) => Some(detail.clone()),
            SolveError::RoundLimitExceeded(limit) => Some(format!("stopped after {limit} rounds")),
        }
    }
}

/// Failure reported by a render, transport or refiner capability.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CapabilityError {
    #[error("timed out after {0}ms")]
    Timeout(u64),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("capability unavailable: {0}")]
    Unavailable(String),

    #[error("capability panicked")]
    Panicked,
}
