//! Extraction of question/answer pairs and conversation turns from model replies.
//!
//! Parsing is best-effort: unrecognised input yields an empty list, never an
//! error. A line-oriented scan over `Question:`/`Answer:` (or `User:`/
//! `Assistant:`) markers runs first; only when it finds nothing does a
//! free-running `Q:`/`A:` (or `Human:`/`Assistant:`) scan over the whole
//! reply take over.

use std::sync::LazyLock;

use regex::Regex;

/// One question with its answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

/// One user message with the assistant's reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    pub user: String,
    pub assistant: String,
}

static QUESTION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^question:?\s*").expect("valid regex"));
static ANSWER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^answer:?\s*").expect("valid regex"));
static USER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^user:?\s*").expect("valid regex"));
static ASSISTANT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^assistant:?\s*").expect("valid regex"));

static Q_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)Q:").expect("valid regex"));
static A_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)A:").expect("valid regex"));
static HUMAN_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Human:").expect("valid regex"));
static ASSISTANT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Assistant:").expect("valid regex"));

/// Extract question/answer pairs in reply order.
pub fn parse_pairs(text: &str) -> Vec<QaPair> {
    let pairs: Vec<QaPair> = scan_lines(text, &QUESTION_LINE, &ANSWER_LINE, Continuation::Pairs)
        .into_iter()
        .map(|(question, answer)| QaPair { question, answer })
        .collect();
    if !pairs.is_empty() {
        return pairs;
    }

    scan_markers(text, &Q_MARKER, &A_MARKER)
        .into_iter()
        .map(|(question, answer)| QaPair { question, answer })
        .collect()
}

/// Extract user/assistant turns in reply order.
pub fn parse_turns(text: &str) -> Vec<ConversationTurn> {
    let turns: Vec<ConversationTurn> =
        scan_lines(text, &USER_LINE, &ASSISTANT_LINE, Continuation::Turns)
            .into_iter()
            .map(|(user, assistant)| ConversationTurn { user, assistant })
            .collect();
    if !turns.is_empty() {
        return turns;
    }

    scan_markers(text, &HUMAN_MARKER, &ASSISTANT_MARKER)
        .into_iter()
        .map(|(user, assistant)| ConversationTurn { user, assistant })
        .collect()
}

/// Where a plain continuation line goes when it cannot extend the reply.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Continuation {
    /// Extends the question only before an answer marker was seen.
    Pairs,
    /// Extends the user message only while the user field is open.
    Turns,
}

#[derive(Default)]
struct OpenPair {
    prompt: String,
    reply: String,
    /// A prompt marker opened the current pair and no reply marker followed yet.
    in_prompt: bool,
    in_reply: bool,
}

impl OpenPair {
    fn take_complete(&mut self) -> Option<(String, String)> {
        let prompt = self.prompt.trim();
        let reply = self.reply.trim();
        if prompt.is_empty() || reply.is_empty() {
            return None;
        }
        Some((prompt.to_string(), reply.to_string()))
    }
}

fn scan_lines(
    text: &str,
    prompt_marker: &Regex,
    reply_marker: &Regex,
    continuation: Continuation,
) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut open = OpenPair::default();

    for line in text.lines() {
        let line = line.trim();

        if let Some(m) = prompt_marker.find(line) {
            out.extend(open.take_complete());
            open = OpenPair {
                prompt: line[m.end()..].to_string(),
                reply: String::new(),
                in_prompt: true,
                in_reply: false,
            };
        } else if let Some(m) = reply_marker.find(line) {
            open.in_prompt = false;
            open.in_reply = true;
            open.reply = line[m.end()..].to_string();
        } else if !line.is_empty() {
            if open.in_reply && !open.reply.is_empty() {
                open.reply.push(' ');
                open.reply.push_str(line);
            } else if !open.prompt.is_empty() {
                let extends_prompt = match continuation {
                    Continuation::Pairs => !open.in_reply,
                    Continuation::Turns => open.in_prompt,
                };
                if extends_prompt {
                    open.prompt.push(' ');
                    open.prompt.push_str(line);
                }
            }
        }
    }

    out.extend(open.take_complete());
    out
}

/// Free-running scan: each prompt marker, up to the first reply marker,
/// then the reply up to the next prompt marker or the end of the text.
fn scan_markers(text: &str, prompt_marker: &Regex, reply_marker: &Regex) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut pos = 0;

    while let Some(open) = prompt_marker.find_at(text, pos) {
        let Some(close) = reply_marker.find_at(text, open.end()) else {
            break;
        };
        let reply_end = prompt_marker
            .find_at(text, close.end())
            .map_or(text.len(), |m| m.start());

        let prompt = text[open.end()..close.start()].trim();
        let reply = text[close.end()..reply_end].trim();
        if !prompt.is_empty() && !reply.is_empty() {
            out.push((prompt.to_string(), reply.to_string()));
        }

        if reply_end == text.len() {
            break;
        }
        pos = reply_end;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(q: &str, a: &str) -> QaPair {
        QaPair {
            question: q.into(),
            answer: a.into(),
        }
    }

    fn turn(u: &str, a: &str) -> ConversationTurn {
        ConversationTurn {
            user: u.into(),
            assistant: a.into(),
        }
    }

    #[test]
    fn parses_well_formed_pairs_in_order() {
        let reply = "Question: What is X?\nAnswer: X is Y.\n\nQuestion: Why?\nAnswer: Because.";
        assert_eq!(
            parse_pairs(reply),
            vec![pair("What is X?", "X is Y."), pair("Why?", "Because.")]
        );
    }

    #[test]
    fn markers_are_case_insensitive_and_colon_optional() {
        let reply = "QUESTION what is rust\nanswer a language";
        assert_eq!(parse_pairs(reply), vec![pair("what is rust", "a language")]);
    }

    #[test]
    fn continuation_lines_are_joined() {
        let reply = "Question: How does\nit work?\nAnswer: It reads\nthe input\nand writes output.";
        assert_eq!(
            parse_pairs(reply),
            vec![pair("How does it work?", "It reads the input and writes output.")]
        );
    }

    #[test]
    fn dangling_question_is_dropped() {
        let reply = "Question: A?\nAnswer: a.\nQuestion: B?";
        assert_eq!(parse_pairs(reply), vec![pair("A?", "a.")]);
    }

    #[test]
    fn answer_on_following_line_is_not_captured() {
        let reply = "Question: A?\nAnswer:\nthe answer";
        assert!(parse_pairs(reply).is_empty());
    }

    #[test]
    fn short_markers_used_only_when_long_markers_absent() {
        let reply = "Q: What is 2+2? A: Four. Q: And 3+3? A: Six.";
        assert_eq!(
            parse_pairs(reply),
            vec![pair("What is 2+2?", "Four."), pair("And 3+3?", "Six.")]
        );

        let mixed = "Question: Long form?\nAnswer: Yes.\nQ: short? A: ignored";
        assert_eq!(parse_pairs(mixed).len(), 1);
    }

    #[test]
    fn short_markers_span_lines() {
        let reply = "q: first\nline\na: multi\nline answer\n";
        assert_eq!(parse_pairs(reply), vec![pair("first\nline", "multi\nline answer")]);
    }

    #[test]
    fn parses_conversation_turns() {
        let reply = "User: Hi there\nAssistant: Hello!\nHow can I help?\nUser: Explain chunks\nAssistant: Slices of text.";
        assert_eq!(
            parse_turns(reply),
            vec![
                turn("Hi there", "Hello! How can I help?"),
                turn("Explain chunks", "Slices of text.")
            ]
        );
    }

    #[test]
    fn human_assistant_fallback() {
        let reply = "Human: ping Assistant: pong Human: again? Assistant: pong pong";
        assert_eq!(
            parse_turns(reply),
            vec![turn("ping", "pong"), turn("again?", "pong pong")]
        );
    }

    #[test]
    fn unparseable_input_yields_nothing() {
        for input in ["", "   ", "Just a summary of the text.", "Answer: orphan", "Q: no answer"] {
            assert!(parse_pairs(input).is_empty(), "pairs from {input:?}");
            assert!(parse_turns(input).is_empty(), "turns from {input:?}");
        }
    }

    #[test]
    fn arbitrary_bytes_do_not_panic() {
        let inputs = ["Q:", "A:", "Q:A:", "Q: A: Q: A:", "ünïcödé Q: ß A: ∂", "\u{0}\n\r\nAnswer"];
        for input in inputs {
            let _ = parse_pairs(input);
            let _ = parse_turns(input);
        }
    }
}
