//! Page renderers backing the engine's `PageRenderer` capability.
//!
//! Chromium (via chromiumoxide) is the real thing. When no browser can be
//! launched the runtime drops to [`http::HttpRenderer`], which fetches the
//! raw HTML and derives visible text itself: pages that build their content
//! client-side then degrade, but everything else keeps working.

pub mod chromium;
pub mod http;

use quizchain::PageRenderer;
use scraper::{Html, Node};
use std::sync::Arc;
use tracing::{info, warn};

/// Elements whose text is never visible.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Launch Chromium, or fall back to plain HTTP rendering.
pub async fn best_available(
    chromium_path: Option<&str>,
    allow_browser: bool,
) -> Arc<dyn PageRenderer> {
    if allow_browser {
        match chromium::ChromiumRenderer::launch(chromium_path).await {
            Ok(renderer) => {
                info!("Chromium renderer initialized");
                return Arc::new(renderer);
            }
            Err(e) => {
                warn!("Failed to initialize Chromium: {e:#}");
                warn!("Running in HTTP-only mode (no JavaScript execution)");
            }
        }
    }
    Arc::new(http::HttpRenderer::new())
}

/// Human-visible text of an HTML document: text nodes outside
/// script/style-like elements, whitespace-collapsed per node, one node per
/// line.
pub fn visible_text(markup: &str) -> String {
    let document = Html::parse_document(markup);
    let mut lines: Vec<String> = Vec::new();

    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
        });
        if hidden {
            continue;
        }
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if !collapsed.is_empty() {
            lines.push(collapsed);
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_text_skips_scripts_and_styles() {
        let html = "<html><head><title>T</title><style>p{}</style></head><body>\
                    <h1>Quiz  3</h1><script>var x = 5;</script><p>Sum the\n values</p>\
                    <noscript>enable js</noscript></body></html>";
        assert_eq!(visible_text(html), "Quiz 3\nSum the values");
    }

    #[test]
    fn test_visible_text_of_garbage() {
        assert_eq!(visible_text(""), "");
        assert_eq!(visible_text("plain words"), "plain words");
    }
}
