//! Content extractors turning raw document sources into provenance-tagged
//! text blocks.
//!
//! One extractor exists per declared content type. All share the same
//! contract: produce zero or more [`TextBlock`]s or fail with
//! [`ExtractionError`], without committing partial side effects. Adding a
//! fourth content type means adding one [`DocumentSource`] variant and one
//! match arm.

/// Stored-PDF extraction.
pub mod pdf;
/// Plain-text passthrough extraction.
pub mod text;
/// Single-page web extraction.
pub mod url;

use reqwest::StatusCode;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::objects::ObjectStoreError;
pub use pdf::PdfExtractor;
pub use text::TextExtractor;
pub use url::UrlExtractor;

/// A provenance-tagged block of extracted text.
#[derive(Debug, Clone)]
pub struct TextBlock {
    /// Extracted text content.
    pub content: String,
    /// Provenance metadata (source URL, storage key, page number).
    pub source_metadata: Map<String, Value>,
}

/// Errors raised when a source is unreadable or unsupported.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// HTTP layer failed while fetching a web page.
    #[error("Failed to fetch page: {0}")]
    Fetch(#[from] reqwest::Error),
    /// Web page responded with a non-success status.
    #[error("Page fetch returned {status} for {url}")]
    PageStatus {
        /// HTTP status returned by the page.
        status: StatusCode,
        /// Fetched URL.
        url: String,
    },
    /// Object storage read failed for a stored file.
    #[error("Object storage read failed: {0}")]
    Object(#[from] ObjectStoreError),
    /// PDF binary could not be parsed.
    #[error("PDF parsing failed for key {file_key}: {message}")]
    Pdf {
        /// Storage key of the failing file.
        file_key: String,
        /// Parser diagnostic.
        message: String,
    },
}

/// Raw source material selected by a document's declared content type.
#[derive(Debug, Clone, Copy)]
pub enum DocumentSource<'a> {
    /// Inline plain text stored on the document record.
    Text {
        /// Stored text content.
        content: &'a str,
    },
    /// A single web page to fetch and extract.
    Url {
        /// Page URL.
        url: &'a str,
    },
    /// A stored file addressed by its storage key.
    StoredFile {
        /// Object storage key.
        file_key: &'a str,
    },
}

/// Closed set of extractors keyed by content type.
pub struct Extractors {
    text: TextExtractor,
    url: UrlExtractor,
    pdf: PdfExtractor,
}

impl Extractors {
    /// Bundle the three extractor variants.
    pub fn new(url: UrlExtractor, pdf: PdfExtractor) -> Self {
        Self {
            text: TextExtractor::new(),
            url,
            pdf,
        }
    }

    /// Run the extractor matching the source variant.
    pub async fn extract(
        &self,
        source: DocumentSource<'_>,
    ) -> Result<Vec<TextBlock>, ExtractionError> {
        match source {
            DocumentSource::Text { content } => self.text.extract(content),
            DocumentSource::Url { url } => self.url.extract(url).await,
            DocumentSource::StoredFile { file_key } => self.pdf.extract(file_key).await,
        }
    }
}
