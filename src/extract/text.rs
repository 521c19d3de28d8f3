//! Plain-text passthrough extractor.

use serde_json::Map;

use super::{ExtractionError, TextBlock};

/// Wraps stored plain text as a single verbatim text block.
#[derive(Debug, Default)]
pub struct TextExtractor;

impl TextExtractor {
    /// Construct the passthrough extractor.
    pub fn new() -> Self {
        Self
    }

    /// Emit the stored text verbatim as one block.
    pub fn extract(&self, content: &str) -> Result<Vec<TextBlock>, ExtractionError> {
        Ok(vec![TextBlock {
            content: content.to_string(),
            source_metadata: Map::new(),
        }])
    }
}
