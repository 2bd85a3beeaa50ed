//! Plain text and Markdown decoder.

use traingen_shared::Result;

use super::DocumentDecoder;
use crate::cleanup;

/// Lossy UTF-8 decoding with the byte-order mark stripped.
pub struct PlainTextDecoder;

impl DocumentDecoder for PlainTextDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<String> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let text = String::from_utf8_lossy(bytes);
        Ok(cleanup::run_pipeline(&text))
    }

    fn name(&self) -> &str {
        "text"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_bom_and_keeps_markdown() {
        let input = b"\xEF\xBB\xBF# Heading\r\n\r\nSome *body* text.\r\n";
        let text = PlainTextDecoder.decode(input).unwrap();
        assert_eq!(text, "# Heading\n\nSome *body* text.");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let text = PlainTextDecoder.decode(b"caf\xe9 au lait").unwrap();
        assert!(text.starts_with("caf"));
        assert!(text.ends_with("au lait"));
    }

    #[test]
    fn whitespace_only_decodes_to_empty() {
        assert_eq!(PlainTextDecoder.decode(b"  \n\t\n ").unwrap(), "");
    }
}
