//! RTF decoder: a small control-word stripping state machine.

use std::iter::Peekable;
use std::str::Chars;

use traingen_shared::Result;

use super::DocumentDecoder;
use crate::cleanup;

/// Destination groups whose content is never document text.
const SKIPPED_DESTINATIONS: &[&str] = &[
    "fonttbl",
    "colortbl",
    "stylesheet",
    "info",
    "pict",
    "object",
    "header",
    "footer",
    "headerl",
    "headerr",
    "footerl",
    "footerr",
    "listtable",
    "listoverridetable",
    "rsidtbl",
    "generator",
    "themedata",
    "colorschememapping",
    "datastore",
    "latentstyles",
    "xmlnstbl",
    "mmathpr",
];

/// Strips control words and groups, keeping body text.
pub struct RtfDecoder;

impl DocumentDecoder for RtfDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<String> {
        let source = String::from_utf8_lossy(bytes);
        let text = RtfScanner::new(&source).run();
        Ok(cleanup::run_pipeline(&text))
    }

    fn name(&self) -> &str {
        "rtf"
    }
}

#[derive(Clone, Copy)]
struct GroupState {
    skip: bool,
    /// Fallback characters following a `\uN` escape (`\ucN`).
    uc: usize,
}

struct RtfScanner<'a> {
    chars: Peekable<Chars<'a>>,
    out: String,
    state: GroupState,
    stack: Vec<GroupState>,
    /// Fallback characters still to swallow after a `\uN` escape.
    pending_skip: usize,
}

impl<'a> RtfScanner<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            out: String::new(),
            state: GroupState { skip: false, uc: 1 },
            stack: Vec::new(),
            pending_skip: 0,
        }
    }

    fn run(mut self) -> String {
        while let Some(c) = self.chars.next() {
            match c {
                '{' => {
                    self.stack.push(self.state);
                    self.pending_skip = 0;
                }
                '}' => {
                    if let Some(prev) = self.stack.pop() {
                        self.state = prev;
                    }
                    self.pending_skip = 0;
                }
                '\\' => self.control(),
                '\r' | '\n' => {}
                other => self.emit(other),
            }
        }
        self.out
    }

    fn emit(&mut self, c: char) {
        if self.pending_skip > 0 {
            self.pending_skip -= 1;
            return;
        }
        if !self.state.skip {
            self.out.push(c);
        }
    }

    /// Emit without consuming the `\uN` fallback budget.
    fn emit_direct(&mut self, c: char) {
        if !self.state.skip {
            self.out.push(c);
        }
    }

    fn control(&mut self) {
        let Some(&next) = self.chars.peek() else {
            return;
        };

        if !next.is_ascii_alphabetic() {
            self.chars.next();
            match next {
                '\\' | '{' | '}' => self.emit(next),
                '\'' => {
                    let hex: String = (0..2).filter_map(|_| self.chars.next()).collect();
                    if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                        // Code page 1252 and Latin-1 agree on the printable range.
                        self.emit(char::from(byte));
                    }
                }
                '*' => self.state.skip = true,
                '~' => self.emit(' '),
                '_' => self.emit('-'),
                '\r' | '\n' => self.emit_direct('\n'),
                _ => {}
            }
            return;
        }

        let mut word = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_alphabetic() {
                word.push(c);
                self.chars.next();
            } else {
                break;
            }
        }

        let mut param = String::new();
        if self.chars.peek() == Some(&'-') {
            param.push('-');
            self.chars.next();
        }
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() {
                param.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        let param: Option<i32> = param.parse().ok();

        if self.chars.peek() == Some(&' ') {
            self.chars.next();
        }

        self.apply_word(&word.to_ascii_lowercase(), param);
    }

    fn apply_word(&mut self, word: &str, param: Option<i32>) {
        match word {
            "par" | "line" | "sect" | "page" | "row" => self.emit_direct('\n'),
            "tab" | "cell" => self.emit_direct('\t'),
            "emdash" | "endash" => self.emit_direct('-'),
            "lquote" | "rquote" => self.emit_direct('\''),
            "ldblquote" | "rdblquote" => self.emit_direct('"'),
            "bullet" => self.emit_direct('\u{2022}'),
            "uc" => self.state.uc = param.unwrap_or(1).max(0) as usize,
            "u" => {
                if let Some(n) = param {
                    let code = (if n < 0 { n + 65_536 } else { n }) as u32;
                    if let Some(c) = char::from_u32(code) {
                        self.emit_direct(c);
                    }
                    self.pending_skip = self.state.uc;
                }
            }
            w if SKIPPED_DESTINATIONS.contains(&w) => self.state.skip = true,
            _ => {}
        }
    }
}
