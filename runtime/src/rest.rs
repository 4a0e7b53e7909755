// Copyright 2026 Quizchain Contributors
// SPDX-License-Identifier: MIT

//! HTTP REST API for quizchain.
//!
//! `/solve` runs a full session and answers with its report; `/task` is the
//! single-question option matcher. Both check the shared secret before
//! doing any work.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use quizchain::Solver;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// State shared by all handlers.
pub struct AppState {
    pub solver: Arc<Solver>,
    pub secret: String,
}

#[derive(Debug, Deserialize)]
struct SolveRequest {
    email: String,
    secret: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct TaskRequest {
    question: String,
    options: Vec<String>,
    secret: String,
}

/// Build the axum Router with all REST endpoints.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/solve", post(handle_solve))
        .route("/task", post(handle_task))
        .layer(cors)
        .with_state(state)
}

/// Start the REST API server on the given port.
pub async fn start(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("REST API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// First option mentioned in the question, else the first option.
pub fn match_option<'a>(question: &str, options: &'a [String]) -> Option<&'a str> {
    let question = question.to_lowercase();
    options
        .iter()
        .find(|opt| question.contains(&opt.to_lowercase()))
        .or_else(|| options.first())
        .map(String::as_str)
}

// ── Handlers ────────────────────────────────────────────────────

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn handle_solve(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SolveRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => return error(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    if req.secret != state.secret {
        warn!(email = %req.email, "rejected /solve with wrong secret");
        return error(StatusCode::FORBIDDEN, "Invalid secret");
    }

    info!(email = %req.email, url = %req.url, "solve requested");
    let solver = Arc::clone(&state.solver);
    // detached so a dropped connection does not cancel the session mid-round
    let task = tokio::spawn(async move { solver.solve(&req.email, &req.secret, &req.url).await });
    match task.await {
        Ok(report) => Json(report.to_json()).into_response(),
        Err(e) => error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("session task panicked: {e}"),
        ),
    }
}

async fn handle_task(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TaskRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => return error(StatusCode::UNPROCESSABLE_ENTITY, rejection.body_text()),
    };
    if req.secret != state.secret {
        return error(StatusCode::FORBIDDEN, "Invalid secret");
    }
    match match_option(&req.question, &req.options) {
        Some(answer) => Json(json!({ "answer": answer })).into_response(),
        None => error(StatusCode::UNPROCESSABLE_ENTITY, "options must not be empty"),
    }
}
