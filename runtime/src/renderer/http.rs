//! Plain-HTTP renderer for hosts without Chromium.
//!
//! Scripts never run here, so pages that build their question in JS only
//! expose it through the encoded payload in the raw markup.

use crate::http_client::HttpClient;
use async_trait::async_trait;
use quizchain::{CapabilityError, PageRenderer, Snapshot};
use std::time::Duration;
use tracing::debug;

pub struct HttpRenderer {
    client: HttpClient,
}

impl Default for HttpRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpRenderer {
    pub fn new() -> Self {
        Self {
            client: HttpClient::new(),
        }
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn render(&self, url: &str, timeout: Duration) -> Result<Snapshot, CapabilityError> {
        let resp = self.client.get_once(url, timeout).await?;
        if !(200..300).contains(&resp.status) {
            return Err(CapabilityError::Status {
                status: resp.status,
                url: url.to_string(),
            });
        }

        let markup = resp.text();
        let text = super::visible_text(&markup);
        debug!(url, final_url = %resp.final_url, markup_len = markup.len(), "page fetched");
        Ok(Snapshot::new(markup, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_render_splits_markup_and_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/q1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><head><title>t</title></head><body><p>What is 2+2?</p>\
                 <script>var x = 1;</script></body></html>",
            ))
            .mount(&server)
            .await;

        let snapshot = HttpRenderer::new()
            .render(&format!("{}/q1", server.uri()), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(snapshot.markup.contains("<script>"));
        assert_eq!(snapshot.visible_text, "What is 2+2?");
    }

    #[tokio::test]
    async fn test_render_rejects_error_status() {
        let server = MockServer::start().await;
        let err = HttpRenderer::new()
            .render(&format!("{}/gone", server.uri()), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, CapabilityError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_server_error_page_is_fetched_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/q"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let err = HttpRenderer::new()
            .render(&format!("{}/q", server.uri()), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, CapabilityError::Status { status: 503, .. }));
        server.verify().await;
    }
}
