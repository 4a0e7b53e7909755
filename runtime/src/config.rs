//! Process configuration, read once from the environment.
//!
//! Nothing here is global: the value is built in `main` and passed down to
//! whatever needs it.

use quizchain::EngineConfig;
use std::time::Duration;

/// Default port for the REST shell.
pub const DEFAULT_PORT: u16 = 8000;

/// Default OpenAI-compatible endpoint for the refiner.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default refiner model.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Default keepalive interval in seconds.
pub const DEFAULT_KEEPALIVE_INTERVAL_SECS: u64 = 240;

/// Settings for the optional answer refiner.
#[derive(Debug, Clone, PartialEq)]
pub struct RefinerConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

/// Settings for the self-ping task.
#[derive(Debug, Clone, PartialEq)]
pub struct KeepaliveConfig {
    pub url: String,
    pub interval: Duration,
}

/// Everything the runtime reads from its environment.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Shared secret callers must present.
    pub secret: Option<String>,
    /// Default identity for one-shot CLI runs.
    pub email: Option<String>,
    pub port: u16,
    pub engine: EngineConfig,
    pub chromium_path: Option<String>,
    /// `None` disables the refiner.
    pub refiner: Option<RefinerConfig>,
    /// `None` disables the keepalive task.
    pub keepalive: Option<KeepaliveConfig>,
}

impl RuntimeConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let secs = |key: &str| get(key).and_then(|v| v.parse::<u64>().ok()).map(Duration::from_secs);

        let mut engine = EngineConfig::default();
        if let Some(budget) = secs("QUIZ_TIME_BUDGET_SECS") {
            engine = engine.with_time_budget(budget);
        }
        if let Some(timeout) = secs("QUIZ_RENDER_TIMEOUT_SECS") {
            engine = engine.with_render_timeout(timeout);
        }

        let refiner = get("OPENAI_API_KEY").map(|api_key| RefinerConfig {
            api_key,
            base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
        });

        let keepalive = get("KEEPALIVE_SELF_URL").map(|url| KeepaliveConfig {
            url,
            interval: secs("KEEPALIVE_INTERVAL_SECONDS")
                .unwrap_or(Duration::from_secs(DEFAULT_KEEPALIVE_INTERVAL_SECS)),
        });

        Self {
            secret: get("QUIZ_SECRET"),
            email: get("QUIZ_EMAIL"),
            port: get("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            engine,
            chromium_path: get("QUIZCHAIN_CHROMIUM_PATH"),
            refiner,
            keepalive,
        }
    }
}
