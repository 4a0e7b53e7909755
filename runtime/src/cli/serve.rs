//! Run the REST service.

use super::build_solver;
use crate::config::RuntimeConfig;
use crate::keepalive;
use crate::rest::{self, AppState};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Start the REST API and block until it exits.
pub async fn run(mut config: RuntimeConfig, port: Option<u16>, no_browser: bool) -> Result<()> {
    if let Some(port) = port {
        config.port = port;
    }
    let secret = config
        .secret
        .clone()
        .context("QUIZ_SECRET must be set to serve requests")?;

    info!("starting quizchain v{}", env!("CARGO_PKG_VERSION"));
    let solver = build_solver(&config, !no_browser).await;

    let _keepalive = config.keepalive.clone().map(keepalive::spawn);

    let state = Arc::new(AppState {
        solver: Arc::new(solver),
        secret,
    });
    rest::start(config.port, state).await
}
