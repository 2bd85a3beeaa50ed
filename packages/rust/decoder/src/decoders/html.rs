//! HTML decoder: visible-text walk over the parsed DOM.

use scraper::{ElementRef, Html, Node};
use traingen_shared::Result;

use super::DocumentDecoder;
use crate::cleanup;

/// Elements whose whole subtree is dropped.
const SKIPPED: &[&str] = &[
    "script", "style", "head", "noscript", "img", "template", "svg", "iframe",
];

/// Elements that start and end on their own line.
const BLOCKS: &[&str] = &[
    "p",
    "div",
    "section",
    "article",
    "main",
    "header",
    "footer",
    "nav",
    "aside",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "ul",
    "ol",
    "li",
    "dl",
    "dt",
    "dd",
    "table",
    "tr",
    "blockquote",
    "pre",
    "hr",
    "figure",
    "figcaption",
    "form",
];

/// Extracts the text a reader would see, one block per line.
pub struct HtmlDecoder;

impl DocumentDecoder for HtmlDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<String> {
        let source = String::from_utf8_lossy(bytes);
        let doc = Html::parse_document(&source);

        let mut out = String::new();
        walk(doc.root_element(), false, &mut out);

        Ok(cleanup::run_pipeline(&out))
    }

    fn name(&self) -> &str {
        "html"
    }
}

fn walk(el: ElementRef<'_>, in_pre: bool, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => {
                if in_pre {
                    out.push_str(&text.text);
                } else {
                    out.extend(text.chars().map(|c| if c.is_whitespace() { ' ' } else { c }));
                }
            }
            Node::Element(_) => {
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                let name = child_el.value().name();
                if SKIPPED.contains(&name) {
                    continue;
                }
                if name == "br" {
                    out.push('\n');
                    continue;
                }

                let block = BLOCKS.contains(&name);
                if block {
                    out.push('\n');
                }
                walk(child_el, in_pre || name == "pre", out);
                match name {
                    "td" | "th" => out.push(' '),
                    _ if block => out.push('\n'),
                    _ => {}
                }
            }
            _ => {}
        }
    }
}
