//! Linked-file aggregation.
//!
//! Follows the first downloadable file the page (or its decoded payload)
//! points at. CSV files are aggregated like HTML tables; for PDFs only the
//! first table on the second page counts, the first page being
//! instructions. Images are not aggregated: they are re-encoded as a data
//! URI and submitted as-is.

use super::table::{self, Grid};
use crate::capability::{guarded, Transport};
use crate::types::FetchedFile;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, warn};

/// Kinds of linked file the cascade knows how to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Pdf,
    Image,
}

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp", "svg"];

impl FileKind {
    /// Classify a URL by the extension of its path.
    pub fn from_url(url: &url::Url) -> Option<Self> {
        let path = url.path().to_ascii_lowercase();
        let ext = path.rsplit_once('.').map(|(_, ext)| ext)?;
        match ext {
            "csv" => Some(FileKind::Csv),
            "pdf" => Some(FileKind::Pdf),
            e if IMAGE_EXTENSIONS.contains(&e) => Some(FileKind::Image),
            _ => None,
        }
    }

    fn image_mime(url: &url::Url, content_type: Option<&str>) -> String {
        if let Some(ct) = content_type {
            let ct = ct.split(';').next().unwrap_or(ct).trim();
            if ct.starts_with("image/") {
                return ct.to_string();
            }
        }
        let path = url.path().to_ascii_lowercase();
        match path.rsplit_once('.').map(|(_, ext)| ext) {
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            Some("bmp") => "image/bmp",
            Some("svg") => "image/svg+xml",
            _ => "image/png",
        }
        .to_string()
    }
}

/// A file reference found on the page, resolved to an absolute URL.
#[derive(Debug, Clone, PartialEq)]
pub struct FileLink {
    pub url: url::Url,
    pub kind: FileKind,
}

fn reference_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)(?:href|src)\s*=\s*["']([^"']+)["']|(https?://[^\s"'`<>()\\]+)"#)
            .expect("valid regex")
    })
}

/// All file references in `sources`, resolved against `page_url`, in order.
pub fn find_file_links(page_url: &str, sources: &[&str]) -> Vec<FileLink> {
    let base = url::Url::parse(page_url).ok();
    let mut links: Vec<FileLink> = Vec::new();

    for source in sources {
        for cap in reference_re().captures_iter(source) {
            let Some(raw) = cap.get(1).or_else(|| cap.get(2)) else {
                continue;
            };
            let raw = raw.as_str().trim().trim_end_matches(['.', ',', ';']);
            let resolved = match &base {
                Some(base) => base.join(raw).ok(),
                None => url::Url::parse(raw).ok(),
            };
            let Some(url) = resolved else { continue };
            if !matches!(url.scheme(), "http" | "https") {
                continue;
            }
            if let Some(kind) = FileKind::from_url(&url) {
                if !links.iter().any(|l| l.url == url) {
                    links.push(FileLink { url, kind });
                }
            }
        }
    }
    links
}

/// Download the first linked file and turn it into a candidate.
pub async fn candidate(
    page_url: &str,
    sources: &[&str],
    question: &str,
    transport: &dyn Transport,
    timeout: Duration,
) -> Option<Value> {
    let link = find_file_links(page_url, sources).into_iter().next()?;
    debug!(url = %link.url, kind = ?link.kind, "fetching linked file");

    let file = match guarded(timeout, transport.fetch(link.url.as_str(), timeout)).await {
        Ok(file) => file,
        Err(e) => {
            warn!(url = %link.url, error = %e, "linked file download failed");
            return None;
        }
    };

    match link.kind {
        FileKind::Csv => table::aggregate_grid(&csv_grid(&file.bytes)?, question),
        FileKind::Pdf => table::aggregate_grid(&pdf_second_page_grid(&file.bytes)?, question),
        FileKind::Image => Some(Value::String(image_data_uri(&link.url, &file))),
    }
}

/// Parse CSV bytes into a grid. The first record is the header.
pub fn csv_grid(bytes: &[u8]) -> Option<Grid> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = reader.headers().ok()?.iter().map(str::to_string).collect();
    let rows: Vec<Vec<String>> = reader
        .records()
        .filter_map(Result::ok)
        .map(|record| record.iter().map(str::to_string).collect())
        .collect();

    if headers.is_empty() && rows.is_empty() {
        return None;
    }
    Some(Grid::new(headers, rows))
}

/// Extract the first text table on the second page of a PDF.
pub fn pdf_second_page_grid(bytes: &[u8]) -> Option<Grid> {
    if !bytes.starts_with(b"%PDF-") {
        return None;
    }
    // pdf-extract panics on some malformed documents
    let pages = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
        .ok()?
        .ok()?;
    let second = pages.get(1)?;
    table::parse_text_table(second)
}

/// `data:<mime>;base64,<payload>` for a downloaded image.
pub fn image_data_uri(url: &url::Url, file: &FetchedFile) -> String {
    let mime = FileKind::image_mime(url, file.content_type.as_deref());
    format!("data:{mime};base64,{}", STANDARD.encode(&file.bytes))
}
