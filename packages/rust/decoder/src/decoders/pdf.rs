//! PDF decoder backed by `pdf_oxide`.

use std::io::Write;
use std::path::Path;

use pdf_oxide::PdfDocument;
use tracing::{debug, warn};
use traingen_shared::{Result, TrainGenError};

use super::DocumentDecoder;
use crate::cleanup;

/// Bytes inspected by the printable-ASCII salvage when parsing fails.
const SALVAGE_LIMIT: usize = 10_000;

/// Extracts per-page text and joins pages with a blank line.
///
/// When the container cannot be parsed, falls back to printable ASCII from
/// the head of the file so that damaged PDFs still yield something.
pub struct PdfDecoder;

impl PdfDecoder {
    fn extract_pages(path: &Path) -> Result<Vec<String>> {
        let mut doc = PdfDocument::open(path)
            .map_err(|e| TrainGenError::decode(format!("failed to parse PDF: {e}")))?;

        let page_count = doc
            .page_count()
            .map_err(|e| TrainGenError::decode(format!("failed to read page count: {e}")))?;

        let mut pages = Vec::with_capacity(page_count);
        for page_index in 0..page_count {
            let text = doc.extract_text(page_index).unwrap_or_default();
            let text = cleanup::run_pipeline(&text);
            if !text.is_empty() {
                pages.push(text);
            }
        }

        debug!(page_count, non_empty = pages.len(), "PDF pages extracted");
        Ok(pages)
    }

    fn parse(bytes: &[u8]) -> Result<String> {
        let mut temp_file = tempfile::NamedTempFile::new()
            .map_err(|e| TrainGenError::decode(format!("failed to create temp file: {e}")))?;
        temp_file
            .write_all(bytes)
            .map_err(|e| TrainGenError::decode(format!("failed to write temp file: {e}")))?;

        let pages = Self::extract_pages(temp_file.path())?;
        Ok(pages.join("\n\n"))
    }
}

impl DocumentDecoder for PdfDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<String> {
        match Self::parse(bytes) {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!(error = %e, "PDF parsing failed, salvaging printable text");
                Ok(cleanup::salvage_printable(bytes, SALVAGE_LIMIT))
            }
        }
    }

    fn name(&self) -> &str {
        "pdf"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_pdf_salvages_printable_ascii() {
        let bytes = b"not a pdf \x00\x01 but has Some Words\xff\xfe in it";
        let text = PdfDecoder.decode(bytes).unwrap();
        assert_eq!(text, "not a pdf but has Some Words in it");
    }

    #[test]
    fn salvage_reads_only_the_head() {
        let mut bytes = vec![b'a'; SALVAGE_LIMIT];
        bytes.extend_from_slice(b" tail-marker");
        let text = PdfDecoder.decode(&bytes).unwrap();
        assert!(!text.contains("tail-marker"));
        assert_eq!(text.len(), SALVAGE_LIMIT);
    }
}
