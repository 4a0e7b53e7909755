// Copyright 2026 Quizchain Contributors
// SPDX-License-Identifier: MIT

//! Quizchain — chained answer-resolution engine for server-hosted quiz pages.
//!
//! A session renders a quiz page, runs the extraction cascade to recover a
//! submission endpoint and an answer, posts the answer, and follows the
//! returned `url` until the chain ends or the time budget runs out.
//!
//! Rendering, HTTP and the optional answer refiner are injected through the
//! traits in [`capability`]; this crate never talks to a browser or a socket
//! on its own.

pub mod capability;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod resolver;
pub mod session;
pub mod types;

pub use capability::{AnswerRefiner, PageRenderer, Transport};
pub use error::{CapabilityError, SolveError};
pub use extract::{Cascade, Candidate, StrategyKind};
pub use normalize::{normalize, Answer};
pub use resolver::resolve_submit_url;
pub use session::{EngineConfig, SessionReport, Solver};
pub use types::*;
