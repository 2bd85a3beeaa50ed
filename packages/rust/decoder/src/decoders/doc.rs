//! Legacy Word (`.doc`) decoder.
//!
//! The OLE compound format is not parsed. Text is recovered by scanning the
//! binary stream for runs of printable characters, ignoring NUL bytes so that
//! UTF-16LE text (the common Word 97+ encoding) reads as plain ASCII.

use traingen_shared::Result;

use super::DocumentDecoder;
use crate::cleanup;

/// Printable-run salvage decoder.
pub struct DocDecoder {
    /// Runs shorter than this are treated as binary noise.
    min_run: usize,
}

impl Default for DocDecoder {
    fn default() -> Self {
        Self { min_run: 4 }
    }
}

impl DocDecoder {
    fn is_text_byte(b: u8) -> bool {
        (0x20..=0x7e).contains(&b) || b == b'\t' || b == b'\r' || b == b'\n'
    }

    fn flush(&self, run: &mut String, out: &mut Vec<String>) {
        let trimmed = run.trim();
        if trimmed.chars().filter(|c| c.is_alphanumeric()).count() >= self.min_run {
            out.push(trimmed.to_string());
        }
        run.clear();
    }
}

impl DocumentDecoder for DocDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<String> {
        let mut runs = Vec::new();
        let mut current = String::new();

        for &b in bytes {
            if b == 0 {
                continue;
            }
            if Self::is_text_byte(b) {
                current.push(if b == b'\r' { '\n' } else { b as char });
            } else {
                self.flush(&mut current, &mut runs);
            }
        }
        self.flush(&mut current, &mut runs);

        Ok(cleanup::run_pipeline(&runs.join("\n")))
    }

    fn name(&self) -> &str {
        "doc"
    }
}
