//! Full sessions against a mock quiz server, through the real HTTP
//! renderer and transport.

use base64::Engine;
use quizchain::{EngineConfig, SolveError, Solver};
use quizchain_runtime::http_client::HttpClient;
use quizchain_runtime::renderer::http::HttpRenderer;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn solver() -> Solver {
    Solver::new(
        Arc::new(HttpRenderer::new()),
        Arc::new(HttpClient::new()),
        EngineConfig::default(),
    )
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(format!("<html><body>{body}</body></html>"))
}

async fn mount_page(server: &MockServer, at: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(html(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_two_round_chain() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/quiz-1",
        &format!(
            "<h1>Quiz 1</h1>\
             <table><tr><th>id</th><th>value</th></tr>\
             <tr><td>1</td><td>10</td></tr><tr><td>2</td><td>20</td></tr></table>\
             <p>Post to <a href=\"{base}/api/submit\">{base}/api/submit</a></p>"
        ),
    )
    .await;

    let encoded = base64::engine::general_purpose::STANDARD
        .encode(format!("The answer is 12. Post to {base}/final/submit"));
    mount_page(
        &server,
        "/quiz-2",
        &format!("<div id=\"q\"></div><script>q.innerHTML = atob(`{encoded}`)</script>"),
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/api/submit"))
        .and(body_partial_json(json!({
            "email": "me@example.com",
            "url": format!("{base}/quiz-1"),
            "answer": 30.0,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "correct": true,
            "url": format!("{base}/quiz-2"),
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/final/submit"))
        .and(body_partial_json(json!({"answer": 12, "url": format!("{base}/quiz-2")})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "correct": true,
            "url": null,
            "reason": null,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let report = solver()
        .solve("me@example.com", "s3cret", &format!("{base}/quiz-1"))
        .await;

    assert!(report.is_success(), "report: {}", report.to_json());
    assert_eq!(report.trail.len(), 2);
    let doc = report.to_json();
    assert_eq!(doc["status"], "completed");
    assert_eq!(doc["result"]["correct"], true);
    assert_eq!(doc["attempts"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_linked_csv_and_fallback_endpoint() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/quiz",
        "<p>Download <a href=\"/files/sales.csv\">this file</a>. What is the total amount?</p>",
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/files/sales.csv"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/csv")
                .set_body_string("region,amount\nnorth,12.5\nsouth,7.5\n"),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(body_partial_json(json!({"answer": 20.0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"correct": true})))
        .expect(1)
        .mount(&server)
        .await;

    let report = solver().solve("e", "s", &format!("{base}/quiz")).await;
    assert!(report.is_success(), "report: {}", report.to_json());
}

#[tokio::test]
async fn test_non_json_submission_response_fails_session() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/quiz", "<p>the answer is 5</p>").await;
    Mock::given(method("POST"))
        .and(path("/submit"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<h1>Internal error</h1>"))
        .mount(&server)
        .await;

    let report = solver().solve("e", "s", &format!("{base}/quiz")).await;

    assert!(matches!(report.outcome, Err(SolveError::SubmitRequestFailed(_))));
    let doc = report.to_json();
    assert_eq!(doc["status"], "failed");
    assert_eq!(doc["error"], "submit_request_failed");
}

#[tokio::test]
async fn test_missing_page_still_submits_acknowledgement() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(body_partial_json(json!({"answer": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"correct": false})))
        .expect(1)
        .mount(&server)
        .await;

    let report = solver().solve("e", "s", &format!("{base}/nowhere")).await;
    assert!(report.is_success());
}
