//! Chromium-based renderer using chromiumoxide.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use quizchain::{CapabilityError, PageRenderer, Snapshot};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Grace period after navigation for late scripts to paint the question.
const SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Find the Chromium binary path.
pub fn find_chromium(explicit: Option<&str>) -> Option<PathBuf> {
    // 1. explicit path (QUIZCHAIN_CHROMIUM_PATH / --chromium)
    if let Some(p) = explicit {
        let path = PathBuf::from(p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. ~/.quizchain/chromium/
    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".quizchain/chromium/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".quizchain/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".quizchain/chromium/chrome-linux64/chrome"),
                home.join(".quizchain/chromium/chrome"),
            ]
        };
        for c in candidates {
            if c.exists() {
                return Some(c);
            }
        }
    }

    // 3. System PATH
    ["google-chrome", "chromium", "chromium-browser"]
        .into_iter()
        .find_map(|name| which::which(name).ok())
}

/// Headless Chromium shared across rounds; each render gets a fresh page.
pub struct ChromiumRenderer {
    browser: Browser,
}

impl ChromiumRenderer {
    /// Launch a headless Chromium instance.
    pub async fn launch(explicit_path: Option<&str>) -> Result<Self> {
        let chrome_path = find_chromium(explicit_path)
            .context("Chromium not found. Set QUIZCHAIN_CHROMIUM_PATH or install Chrome.")?;

        let config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self { browser })
    }

    async fn render_page(&self, page: &Page, url: &str, timeout: Duration) -> Result<Snapshot, CapabilityError> {
        match tokio::time::timeout(timeout, page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(CapabilityError::Navigation(e.to_string())),
            Err(_) => return Err(CapabilityError::Timeout(timeout.as_millis() as u64)),
        }
        tokio::time::sleep(SETTLE_DELAY).await;

        let visible_text: String = evaluate_string(page, "document.documentElement.innerText").await?;
        let markup: String = evaluate_string(page, "document.documentElement.outerHTML").await?;
        debug!(url, text_len = visible_text.len(), markup_len = markup.len(), "page rendered");

        Ok(Snapshot::new(markup, visible_text))
    }
}

async fn evaluate_string(page: &Page, script: &str) -> Result<String, CapabilityError> {
    let result = page
        .evaluate(script)
        .await
        .map_err(|e| CapabilityError::Navigation(format!("JS execution failed: {e}")))?;
    result
        .into_value::<String>()
        .map_err(|e| CapabilityError::Decode(format!("failed to convert JS result: {e:?}")))
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    async fn render(&self, url: &str, timeout: Duration) -> Result<Snapshot, CapabilityError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| CapabilityError::Unavailable(format!("failed to create new page: {e}")))?;

        let result = self.render_page(&page, url, timeout).await;
        let _ = page.close().await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_chromium_renders_text_and_markup() {
        let renderer = ChromiumRenderer::launch(None)
            .await
            .expect("failed to launch renderer");

        let snapshot = renderer
            .render(
                "data:text/html,<h1>Hello</h1><script>document.write('<p>42</p>')</script>",
                Duration::from_secs(10),
            )
            .await
            .expect("render failed");

        assert!(snapshot.visible_text.contains("Hello"));
        assert!(snapshot.visible_text.contains("42"));
        assert!(!snapshot.visible_text.contains("document.write"));
        assert!(snapshot.markup.contains("<h1>Hello</h1>"));
    }

    #[test]
    fn test_explicit_missing_path_is_skipped() {
        let found = find_chromium(Some("/definitely/not/here/chrome"));
        assert_ne!(found, Some(PathBuf::from("/definitely/not/here/chrome")));
    }
}
