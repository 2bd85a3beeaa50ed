//! Document decoding for traingen.
//!
//! Turns PDF, DOCX, DOC, RTF, TXT, Markdown and HTML documents into plain
//! text. Each format has a [`DocumentDecoder`]; the [`DecoderRegistry`]
//! builds them on first use and runs large binary decodes on a blocking
//! worker under a timeout.

mod cleanup;
pub mod decoders;
pub mod registry;

pub use decoders::{
    DocDecoder, DocumentDecoder, DocxDecoder, HtmlDecoder, PdfDecoder, PlainTextDecoder,
    RtfDecoder, build_decoder,
};
pub use registry::{DEFAULT_DECODE_TIMEOUT, DecoderRegistry, OFFLOAD_THRESHOLD_BYTES};
