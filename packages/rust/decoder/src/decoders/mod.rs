//! Document decoder trait and built-in decoders for each supported file type.
//!
//! A decoder turns the raw bytes of one document into plain text. Decoders are
//! synchronous and CPU-bound; the [`crate::DecoderRegistry`] decides whether a
//! call runs inline or on a blocking worker.

mod doc;
mod docx;
mod html;
mod pdf;
mod rtf;
mod text;

use std::sync::Arc;

use traingen_shared::{FileType, Result};

pub use doc::DocDecoder;
pub use docx::DocxDecoder;
pub use html::HtmlDecoder;
pub use pdf::PdfDecoder;
pub use rtf::RtfDecoder;
pub use text::PlainTextDecoder;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Extracts plain text from a document's byte content.
pub trait DocumentDecoder: Send + Sync {
    /// Decode the document. Returns cleaned text, possibly empty.
    fn decode(&self, bytes: &[u8]) -> Result<String>;

    /// Human-readable decoder name for tracing.
    fn name(&self) -> &str;
}

/// Construct the built-in decoder for a file type.
pub fn build_decoder(file_type: FileType) -> Arc<dyn DocumentDecoder> {
    match file_type {
        FileType::Pdf => Arc::new(PdfDecoder),
        FileType::Docx => Arc::new(DocxDecoder),
        FileType::Doc => Arc::new(DocDecoder::default()),
        FileType::Rtf => Arc::new(RtfDecoder),
        FileType::Txt | FileType::Md => Arc::new(PlainTextDecoder),
        FileType::Html => Arc::new(HtmlDecoder),
    }
}
