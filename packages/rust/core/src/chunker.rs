//! Boundary-aware text chunking.
//!
//! Text is cut into windows of `target_size` characters. A cut that falls
//! inside the text is pushed forward to just after the next `.` (if one lies
//! within 100 characters) or else the next newline (within 50 characters).
//! Chunks are contiguous and together reproduce the input exactly.

/// How far past a window boundary to look for a sentence end.
const SENTENCE_LOOKAHEAD: usize = 100;
/// How far past a window boundary to look for a line end.
const LINE_LOOKAHEAD: usize = 50;

/// A contiguous slice of the source text. Offsets are byte offsets on char boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Split `text` into chunks with their byte spans.
pub fn chunk_spans(text: &str, target_size: usize) -> Vec<Chunk> {
    let size = target_size.max(1);
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let len = chars.len();
    let byte_at = |idx: usize| chars.get(idx).map_or(text.len(), |&(b, _)| b);

    let find = |needle: char, from: usize, lookahead: usize| {
        let limit = (from + lookahead).min(len);
        (from..limit).find(|&i| chars[i].1 == needle)
    };

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < len {
        let mut end = start + size;
        if end < len {
            if let Some(dot) = find('.', end, SENTENCE_LOOKAHEAD) {
                end = dot + 1;
            } else if let Some(newline) = find('\n', end, LINE_LOOKAHEAD) {
                end = newline + 1;
            }
        }
        let end = end.min(len);

        let (start_byte, end_byte) = (byte_at(start), byte_at(end));
        chunks.push(Chunk {
            start: start_byte,
            end: end_byte,
            text: text[start_byte..end_byte].to_string(),
        });
        start = end;
    }

    chunks
}

/// Split `text` into chunk strings.
pub fn chunk_text(text: &str, target_size: usize) -> Vec<String> {
    chunk_spans(text, target_size)
        .into_iter()
        .map(|c| c.text)
        .collect()
}

/// Rough chunk count for progress reporting. Always at least 1.
pub fn estimate_chunks(text: &str, target_size: usize) -> usize {
    let len = text.chars().count();
    len.div_ceil(target_size.max(1)).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(chunk_text("", 10).is_empty());
        assert_eq!(estimate_chunks("", 10), 1);
    }

    #[test]
    fn short_text_is_one_chunk() {
        let text = "A short document.";
        assert_eq!(chunk_text(text, 2000), vec![text.to_string()]);
        assert_eq!(chunk_text(text, text.chars().count()), vec![text.to_string()]);
    }

    #[test]
    fn cut_extends_to_next_period() {
        let text = "aaaaaaaaaa bbb. ccc";
        let chunks = chunk_text(text, 10);
        assert_eq!(chunks, vec!["aaaaaaaaaa bbb.", " ccc"]);
    }

    #[test]
    fn cut_falls_back_to_newline() {
        let text = format!("{}\nrest{}", "x".repeat(12), "y".repeat(200));
        let chunks = chunk_text(&text, 10);
        assert_eq!(chunks[0], format!("{}\n", "x".repeat(12)));
    }

    #[test]
    fn hard_cut_when_no_boundary_is_near() {
        let text = "z".repeat(250);
        let chunks = chunk_text(&text, 100);
        let lens: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
        assert_eq!(lens, [100, 100, 50]);
    }

    #[test]
    fn period_beyond_lookahead_is_ignored() {
        let text = format!("{}.", "w".repeat(10 + SENTENCE_LOOKAHEAD));
        let chunks = chunk_text(&text, 10);
        assert_eq!(chunks[0].len(), 10);
    }

    #[test]
    fn chunks_reassemble_to_input() {
        let text = "First sentence here. Second one follows.\nA new line starts.\n\
                    Another paragraph with more words in it. End."
            .repeat(7);
        for size in [1, 7, 33, 100, 1000] {
            let chunks = chunk_text(&text, size);
            assert_eq!(chunks.concat(), text, "size {size}");
            assert!(chunks.iter().all(|c| c.chars().count() <= size + SENTENCE_LOOKAHEAD));
        }
    }

    #[test]
    fn multibyte_text_is_never_split_mid_char() {
        let text = "日本語のテキスト。これは二番目の文です。".repeat(20);
        let spans = chunk_spans(&text, 9);
        let mut expected_start = 0;
        for span in &spans {
            assert_eq!(span.start, expected_start);
            assert!(text.is_char_boundary(span.end));
            assert_eq!(&text[span.start..span.end], span.text);
            expected_start = span.end;
        }
        assert_eq!(expected_start, text.len());
    }

    #[test]
    fn zero_size_is_treated_as_one() {
        assert_eq!(chunk_text("abc", 0), vec!["a", "b", "c"]);
        assert_eq!(estimate_chunks("abc", 0), 3);
    }

    #[test]
    fn estimate_rounds_up() {
        assert_eq!(estimate_chunks(&"a".repeat(2001), 2000), 2);
        assert_eq!(estimate_chunks(&"a".repeat(500), 2000), 1);
    }
}
