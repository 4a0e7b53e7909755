//! The extraction cascade.
//!
//! Strategies are tried in a fixed order and the first one that yields a
//! value wins:
//!
//! 1. [`StrategyKind::EncodedPayload`]: explicit answer or table inside a
//!    base64 payload embedded in the markup
//! 2. [`StrategyKind::TableAggregate`]: first HTML table on the page
//! 3. [`StrategyKind::LinkedFile`]: first linked CSV / PDF / image
//! 4. [`StrategyKind::AnswerLiteral`]: an `answer is <value>` phrase
//! 5. [`StrategyKind::BareNumber`]: numbers in the visible text
//! 6. [`StrategyKind::ExternalRefiner`]: the optional refiner
//!
//! Strategies 1-4 are confident. Strategy 5 always produces something, but
//! it is a guess: when a refiner is configured the guess is handed to it
//! together with the question, and the refiner's text is used verbatim. A
//! failing refiner leaves the guess in place.
//!
//! Nothing in here returns an error. A strategy that cannot parse its input
//! simply yields no candidate; if nothing at all is produced the answer is
//! the placeholder `0`.

pub mod linked;
pub mod literal;
pub mod payload;
pub mod table;

use crate::capability::{guarded, AnswerRefiner, Transport};
use crate::normalize::{normalize, Answer};
use crate::types::Snapshot;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Identifies which strategy produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    EncodedPayload,
    TableAggregate,
    LinkedFile,
    AnswerLiteral,
    BareNumber,
    ExternalRefiner,
    /// Nothing matched; the `0` placeholder was used.
    Placeholder,
}

impl StrategyKind {
    /// Confident local strategies, in priority order.
    pub const LOCAL: [StrategyKind; 4] = [
        StrategyKind::EncodedPayload,
        StrategyKind::TableAggregate,
        StrategyKind::LinkedFile,
        StrategyKind::AnswerLiteral,
    ];
}

/// A value produced by one strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub strategy: StrategyKind,
    pub value: Value,
}

/// One page as seen by the cascade: the snapshot plus its decoded payload.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub url: String,
    pub snapshot: Snapshot,
    /// Text of any base64 payload embedded in the markup.
    pub decoded: Option<String>,
}

impl PageContext {
    pub fn new(url: impl Into<String>, snapshot: Snapshot) -> Self {
        let decoded = payload::decode_payload(&snapshot.markup);
        Self {
            url: url.into(),
            snapshot,
            decoded,
        }
    }

    /// Question text: visible text followed by the decoded payload.
    pub fn question(&self) -> String {
        match &self.decoded {
            Some(decoded) => format!("{}\n{}", self.snapshot.visible_text, decoded),
            None => self.snapshot.visible_text.clone(),
        }
    }
}

/// The answer chosen for a page.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub answer: Answer,
    pub strategy: StrategyKind,
}

/// Runs the strategies in order against a page.
#[derive(Clone)]
pub struct Cascade {
    transport: Arc<dyn Transport>,
    refiner: Option<Arc<dyn AnswerRefiner>>,
    download_timeout: Duration,
    refine_timeout: Duration,
}

impl Cascade {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            refiner: None,
            download_timeout: Duration::from_secs(30),
            refine_timeout: Duration::from_secs(20),
        }
    }

    pub fn with_refiner(mut self, refiner: Arc<dyn AnswerRefiner>) -> Self {
        self.refiner = Some(refiner);
        self
    }

    pub fn with_timeouts(mut self, download: Duration, refine: Duration) -> Self {
        self.download_timeout = download;
        self.refine_timeout = refine;
        self
    }

    /// Try one confident strategy.
    pub async fn attempt(&self, kind: StrategyKind, page: &PageContext) -> Option<Candidate> {
        let snapshot = &page.snapshot;
        let value = match kind {
            StrategyKind::EncodedPayload => page.decoded.as_deref().and_then(payload::candidate),
            StrategyKind::TableAggregate => {
                table::aggregate_markup(&snapshot.markup, &snapshot.visible_text)
            }
            StrategyKind::LinkedFile => {
                let mut sources = vec![snapshot.markup.as_str()];
                if let Some(decoded) = page.decoded.as_deref() {
                    sources.push(decoded);
                }
                linked::candidate(
                    &page.url,
                    &sources,
                    &page.question(),
                    self.transport.as_ref(),
                    self.download_timeout,
                )
                .await
            }
            StrategyKind::AnswerLiteral => literal::answer_phrase(&snapshot.visible_text),
            StrategyKind::BareNumber => Some(literal::bare_number(&snapshot.visible_text)),
            StrategyKind::ExternalRefiner | StrategyKind::Placeholder => None,
        };
        value.map(|value| Candidate {
            strategy: kind,
            value,
        })
    }

    /// Pick the answer for a page. Never fails.
    pub async fn run(&self, page: &PageContext) -> Extraction {
        for kind in StrategyKind::LOCAL {
            if let Some(candidate) = self.attempt(kind, page).await {
                debug!(strategy = ?kind, value = %candidate.value, "strategy matched");
                return Extraction {
                    answer: normalize(candidate.value),
                    strategy: kind,
                };
            }
        }

        let fallback = match self.attempt(StrategyKind::BareNumber, page).await {
            Some(candidate) => Extraction {
                answer: normalize(candidate.value),
                strategy: StrategyKind::BareNumber,
            },
            None => Extraction {
                answer: Answer::placeholder(),
                strategy: StrategyKind::Placeholder,
            },
        };

        match self.refine(page, &fallback.answer).await {
            Some(refined) => Extraction {
                answer: Answer::Text(refined),
                strategy: StrategyKind::ExternalRefiner,
            },
            None => fallback,
        }
    }

    async fn refine(&self, page: &PageContext, raw: &Answer) -> Option<String> {
        let refiner = self.refiner.as_ref()?;
        let question = page.question();
        let raw = raw.to_string();
        match guarded(
            self.refine_timeout,
            refiner.refine(&question, &raw, self.refine_timeout),
        )
        .await
        {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => {
                warn!("refiner returned an empty answer, keeping local value");
                None
            }
            Err(e) => {
                warn!(error = %e, "refiner failed, keeping local value");
                None
            }
        }
    }
}
