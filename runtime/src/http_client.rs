//! Async HTTP client wrapping reqwest.
//!
//! Implements the engine's [`Transport`]: JSON submissions and linked-file
//! downloads. Submissions and page renders are never retried; only
//! linked-file downloads retry on 5xx.

use async_trait::async_trait;
use quizchain::{CapabilityError, FetchedFile, Transport};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) \
                          AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/131.0.0.0 Safari/537.36";

/// Response from an HTTP GET request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Final URL after redirects.
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// HTTP client for page fetches, file downloads and submissions.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// Single GET, no retries. Page renders use this: a failed render is
    /// absorbed by the engine, never repeated.
    pub async fn get_once(&self, url: &str, timeout: Duration) -> Result<HttpResponse, CapabilityError> {
        self.get_with_retries(url, timeout, 0).await
    }

    /// GET with up to two retries on 5xx responses or connection errors.
    pub async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, CapabilityError> {
        self.get_with_retries(url, timeout, 2).await
    }

    async fn get_with_retries(
        &self,
        url: &str,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<HttpResponse, CapabilityError> {
        let mut retries = 0u32;

        loop {
            let resp = self.client.get(url).timeout(timeout).send().await;

            match resp {
                Ok(r) => {
                    let status = r.status().as_u16();
                    if status >= 500 && retries < max_retries {
                        retries += 1;
                        tokio::time::sleep(Duration::from_millis(500 * 2u64.pow(retries - 1)))
                            .await;
                        continue;
                    }

                    let final_url = r.url().to_string();
                    let content_type = r
                        .headers()
                        .get(reqwest::header::CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    let body = r.bytes().await.map_err(transport_error)?.to_vec();

                    return Ok(HttpResponse {
                        final_url,
                        status,
                        content_type,
                        body,
                    });
                }
                Err(e) => {
                    if retries < max_retries && !e.is_timeout() {
                        retries += 1;
                        tokio::time::sleep(Duration::from_millis(500 * 2u64.pow(retries - 1)))
                            .await;
                        continue;
                    }
                    return Err(transport_error(e));
                }
            }
        }
    }
}

fn transport_error(e: reqwest::Error) -> CapabilityError {
    if e.is_timeout() {
        CapabilityError::Transport(format!("request timed out: {e}"))
    } else {
        CapabilityError::Transport(e.to_string())
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<Value, CapabilityError> {
        let resp = self
            .client
            .post(url)
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status().as_u16();
        let text = resp.text().await.map_err(transport_error)?;
        debug!(url, status, body_len = text.len(), "submission response");

        // a JSON error body is still a response the chain can act on
        serde_json::from_str(&text).map_err(|e| {
            let preview: String = text.chars().take(200).collect();
            CapabilityError::Decode(format!("HTTP {status}, non-JSON body ({e}): {preview}"))
        })
    }

    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedFile, CapabilityError> {
        let resp = self.get(url, timeout).await?;
        if !(200..300).contains(&resp.status) {
            return Err(CapabilityError::Status {
                status: resp.status,
                url: url.to_string(),
            });
        }
        Ok(FetchedFile {
            bytes: resp.body,
            content_type: resp.content_type,
        })
    }
}
