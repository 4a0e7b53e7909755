//! CLI subcommand implementations for the quizchain binary.

pub mod doctor;
pub mod serve;
pub mod solve_cmd;

use crate::config::RuntimeConfig;
use crate::http_client::HttpClient;
use crate::refiner::OpenAiRefiner;
use crate::renderer;
use clap::ValueEnum;
use quizchain::Solver;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "quizchain=info,quizchain_runtime=info";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Initialise tracing on stderr. `RUST_LOG` wins over `--verbose`.
pub fn init_tracing(format: LogFormat, verbose: bool) {
    let default = if verbose {
        "quizchain=debug,quizchain_runtime=debug"
    } else {
        DEFAULT_FILTER
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Wire the engine to the best available renderer, the reqwest transport
/// and, when a key is configured, the refiner.
pub async fn build_solver(config: &RuntimeConfig, allow_browser: bool) -> Solver {
    let renderer = renderer::best_available(config.chromium_path.as_deref(), allow_browser).await;
    let solver = Solver::new(renderer, Arc::new(HttpClient::new()), config.engine.clone());

    match &config.refiner {
        Some(refiner) => {
            info!(model = %refiner.model, "answer refiner enabled");
            solver.with_refiner(Arc::new(OpenAiRefiner::new(refiner.clone())))
        }
        None => solver,
    }
}
