//! Stored-PDF extractor.

use std::sync::Arc;

use serde_json::{Map, Value};

use super::{ExtractionError, TextBlock};
use crate::objects::ObjectStore;

/// Extracts text from PDFs held in object storage, one block per page.
pub struct PdfExtractor {
    objects: Arc<dyn ObjectStore>,
}

impl PdfExtractor {
    /// Construct an extractor reading binaries from the given object store.
    pub fn new(objects: Arc<dyn ObjectStore>) -> Self {
        Self { objects }
    }

    /// Fetch the binary by storage key and emit one text block per page,
    /// preserving original page order. Pages without any text are skipped.
    pub async fn extract(&self, file_key: &str) -> Result<Vec<TextBlock>, ExtractionError> {
        let bytes = self.objects.get(file_key).await?;
        tracing::debug!(file_key, bytes = bytes.len(), "Parsing PDF");

        let pages =
            pdf_extract::extract_text_from_mem_by_pages(&bytes).map_err(|source| {
                ExtractionError::Pdf {
                    file_key: file_key.to_string(),
                    message: source.to_string(),
                }
            })?;

        let mut blocks = Vec::new();
        for (index, page) in pages.into_iter().enumerate() {
            if page.trim().is_empty() {
                tracing::debug!(file_key, page = index + 1, "Skipping empty page");
                continue;
            }
            let mut source_metadata = Map::new();
            source_metadata.insert("file_key".into(), Value::String(file_key.to_string()));
            source_metadata.insert("page_number".into(), Value::from(index + 1));
            blocks.push(TextBlock {
                content: page,
                source_metadata,
            });
        }
        Ok(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{HttpObjectStore, ObjectStoreError};
    use httpmock::{Method::GET, MockServer};
    use reqwest::Client;

    /// Assemble a minimal PDF with one Helvetica text stream per page.
    /// Cross-reference offsets are measured from the buffer while writing,
    /// so the file parses without repair.
    fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
        let font_id = 3 + 2 * pages.len();
        let mut objects: Vec<String> = Vec::new();
        objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
        let kids: Vec<String> = (0..pages.len())
            .map(|index| format!("{} 0 R", 3 + 2 * index))
            .collect();
        objects.push(format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            pages.len()
        ));
        for (index, text) in pages.iter().enumerate() {
            let content_id = 4 + 2 * index;
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
                 /Resources << /Font << /F1 {font_id} 0 R >> >> \
                 /Contents {content_id} 0 R >>"
            ));
            let stream = if text.is_empty() {
                String::new()
            } else {
                format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET")
            };
            objects.push(format!(
                "<< /Length {} >>\nstream\n{stream}\nendstream",
                stream.len()
            ));
        }
        objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string());

        let mut out = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (index, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", index + 1).as_bytes());
        }
        let xref_at = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
        out.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets {
            out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF",
                objects.len() + 1
            )
            .as_bytes(),
        );
        out
    }

    fn extractor_for(server: &MockServer) -> PdfExtractor {
        PdfExtractor::new(Arc::new(HttpObjectStore::new(
            Client::new(),
            server.base_url(),
        )))
    }

    #[tokio::test]
    async fn emits_one_block_per_page_preserving_positions() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/uploads/notes.pdf");
                then.status(200)
                    .body(pdf_with_pages(&["Quarterly revenue rose", "", "Appendix tables"]));
            })
            .await;

        let blocks = extractor_for(&server)
            .extract("uploads/notes.pdf")
            .await
            .unwrap();

        // The blank middle page is dropped; page numbers keep the original
        // positions of the surviving pages.
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].content.contains("Quarterly"));
        assert_eq!(blocks[0].source_metadata["file_key"], "uploads/notes.pdf");
        assert_eq!(blocks[0].source_metadata["page_number"], 1);
        assert!(blocks[1].content.contains("Appendix"));
        assert_eq!(blocks[1].source_metadata["page_number"], 3);
    }

    #[tokio::test]
    async fn missing_object_surfaces_the_storage_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/uploads/missing.pdf");
                then.status(404);
            })
            .await;

        let error = extractor_for(&server)
            .extract("uploads/missing.pdf")
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            ExtractionError::Object(ObjectStoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn unparseable_binary_reports_the_key() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/uploads/broken.pdf");
                then.status(200).body("not a pdf at all");
            })
            .await;

        let error = extractor_for(&server)
            .extract("uploads/broken.pdf")
            .await
            .unwrap_err();
        match error {
            ExtractionError::Pdf { file_key, .. } => {
                assert_eq!(file_key, "uploads/broken.pdf");
            }
            other => panic!("expected a parse error, got {other:?}"),
        }
    }
}
