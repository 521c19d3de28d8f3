//! Single-page web extractor.
//!
//! Fetches exactly one page (no link following), restricts extraction to
//! likely main-content containers with a fallback to the full body, and
//! normalizes whitespace before emitting one text block. Pages that are
//! boilerplate-only or pathologically large are soft-skipped: the extractor
//! logs and returns no blocks instead of failing the message.

use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::{Map, Value};

use super::{ExtractionError, TextBlock};

/// Pages whose extracted text falls below this are treated as boilerplate.
pub const MIN_USEFUL_CHARS: usize = 400;
/// Pages whose extracted text exceeds this are treated as runaway content.
pub const MAX_TOTAL_CHARS: usize = 400_000;

const MAIN_CONTENT_SELECTOR: &str = "main, article, #content, .content, .markdown-body";

/// Extracts the main content of a single web page.
pub struct UrlExtractor {
    client: Client,
}

impl UrlExtractor {
    /// Construct an extractor on top of a shared HTTP client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetch one page and emit its main content as a single text block.
    ///
    /// Returns an empty list when the page is boilerplate-only (under
    /// [`MIN_USEFUL_CHARS`]) or runaway (over [`MAX_TOTAL_CHARS`]).
    pub async fn extract(&self, url: &str) -> Result<Vec<TextBlock>, ExtractionError> {
        tracing::debug!(url, "Fetching page");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::PageStatus {
                status,
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        let content = normalize_whitespace(&extract_page_text(&body));
        let total_chars = content.chars().count();

        if total_chars < MIN_USEFUL_CHARS {
            tracing::warn!(url, total_chars, "Page too small; skipping");
            return Ok(Vec::new());
        }
        if total_chars > MAX_TOTAL_CHARS {
            tracing::warn!(url, total_chars, "Page too large; skipping");
            return Ok(Vec::new());
        }

        let mut source_metadata = Map::new();
        source_metadata.insert("source_url".into(), Value::String(url.to_string()));
        Ok(vec![TextBlock {
            content,
            source_metadata,
        }])
    }
}

/// Collect text from likely main-content containers, falling back to `body`.
fn extract_page_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let selector = Selector::parse(MAIN_CONTENT_SELECTOR).expect("static selector parses");
    let mut parts: Vec<String> = document
        .select(&selector)
        .map(|element| element.text().collect::<Vec<_>>().join(" "))
        .collect();

    if parts.is_empty() {
        let body = Selector::parse("body").expect("static selector parses");
        parts = document
            .select(&body)
            .map(|element| element.text().collect::<Vec<_>>().join(" "))
            .collect();
    }

    parts.join("\n")
}

/// Replace non-breaking-space artifacts, strip trailing spaces, and collapse
/// repeated blank lines down to a single one.
fn normalize_whitespace(text: &str) -> String {
    let replaced = text.replace('\u{a0}', " ");
    let mut lines: Vec<&str> = Vec::new();
    let mut blanks = 0usize;
    for line in replaced.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blanks += 1;
            if blanks == 1 {
                lines.push("");
            }
        } else {
            blanks = 0;
            lines.push(line);
        }
    }
    lines.join("\n").trim().to_string()
}
