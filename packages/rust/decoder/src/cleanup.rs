//! Post-extraction cleanup pipeline for decoded text.
//!
//! Each cleanup pass is a function `&str -> String` applied in sequence.
//! Decoders run the pipeline on whatever their extraction produced.

use std::sync::LazyLock;

use regex::Regex;

/// Run the full cleanup pipeline on raw extracted text.
pub(crate) fn run_pipeline(text: &str) -> String {
    let mut result = normalize_line_endings(text);

    result = strip_control_chars(&result);
    result = collapse_inline_whitespace(&result);
    result = normalize_whitespace(&result);
    result = clean_blank_lines(&result);

    result.trim().to_string()
}

// ---------------------------------------------------------------------------
// Pass 1: Line endings
// ---------------------------------------------------------------------------

/// Convert `\r\n` and lone `\r` to `\n`.
fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

// ---------------------------------------------------------------------------
// Pass 2: Control characters
// ---------------------------------------------------------------------------

/// Drop control characters other than newline and tab (form feeds, NULs, BOMs).
fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| *c == '\n' || *c == '\t' || !(c.is_control() || *c == '\u{feff}'))
        .collect()
}

// ---------------------------------------------------------------------------
// Pass 3: Inline whitespace
// ---------------------------------------------------------------------------

/// Collapse runs of spaces/tabs inside a line to a single space.
fn collapse_inline_whitespace(text: &str) -> String {
    static INLINE_WS_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[ \t\u{a0}]{2,}").expect("valid regex"));

    INLINE_WS_RE.replace_all(text, " ").to_string()
}

// ---------------------------------------------------------------------------
// Pass 4: Trailing whitespace
// ---------------------------------------------------------------------------

/// Trim whitespace at both ends of every line.
fn normalize_whitespace(text: &str) -> String {
    text.lines().map(str::trim).collect::<Vec<_>>().join("\n")
}

// ---------------------------------------------------------------------------
// Pass 5: Blank lines
// ---------------------------------------------------------------------------

/// Collapse runs of 2+ blank lines into exactly one.
fn clean_blank_lines(text: &str) -> String {
    static MULTI_BLANK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

    MULTI_BLANK_RE.replace_all(text, "\n\n").to_string()
}

// ---------------------------------------------------------------------------
// Salvage helpers
// ---------------------------------------------------------------------------

/// Map the first `limit` bytes to printable ASCII, replacing everything else
/// with spaces and collapsing whitespace. Last-resort recovery for containers
/// whose real parser failed.
pub(crate) fn salvage_printable(bytes: &[u8], limit: usize) -> String {
    let head = &bytes[..bytes.len().min(limit)];
    let mapped: String = head
        .iter()
        .map(|&b| {
            if (0x20..=0x7e).contains(&b) || b == b'\n' || b == b'\r' || b == b'\t' {
                b as char
            } else {
                ' '
            }
        })
        .collect();

    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_line_endings_converts_crlf() {
        assert_eq!(normalize_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn strip_control_chars_keeps_newlines_and_tabs() {
        let input = "a\u{0}b\u{c}c\n\td\u{feff}";
        assert_eq!(strip_control_chars(input), "abc\n\td");
    }

    #[test]
    fn collapse_inline_whitespace_single_spaces() {
        assert_eq!(collapse_inline_whitespace("a   b\t\tc d"), "a b c d");
    }

    #[test]
    fn clean_blank_lines_collapses_excess() {
        let input = "Line 1\n\n\n\n\nLine 2";
        assert_eq!(clean_blank_lines(input), "Line 1\n\nLine 2");
    }

    #[test]
    fn clean_blank_lines_keeps_double() {
        let input = "Line 1\n\nLine 2";
        assert_eq!(clean_blank_lines(input), input);
    }

    #[test]
    fn full_pipeline_cleans_text() {
        let input = "  Title  \r\n\r\n\r\n\r\nBody   text\there.  \n";
        assert_eq!(run_pipeline(input), "Title\n\nBody text here.");
    }

    #[test]
    fn salvage_printable_respects_limit() {
        let mut bytes = b"%PDF-1.4 \x00\x01hello\xffworld".to_vec();
        bytes.extend(std::iter::repeat_n(b'x', 50));
        let text = salvage_printable(&bytes, 24);
        assert_eq!(text, "%PDF-1.4 hello world");
    }
}
