//! DOCX decoder backed by `docx-rs`.

use docx_rs::{DocumentChild, Paragraph, ParagraphChild, RunChild, read_docx};
use traingen_shared::{Result, TrainGenError};

use super::DocumentDecoder;
use crate::cleanup;

/// Walks Document → Paragraph → Run → Text and emits one line per paragraph.
pub struct DocxDecoder;

impl DocumentDecoder for DocxDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<String> {
        let docx = read_docx(bytes)
            .map_err(|e| TrainGenError::decode(format!("failed to parse DOCX: {e}")))?;

        let paragraphs: Vec<String> = docx
            .document
            .children
            .iter()
            .filter_map(|child| match child {
                DocumentChild::Paragraph(para) => Some(paragraph_text(para)),
                _ => None,
            })
            .filter(|text| !text.trim().is_empty())
            .collect();

        Ok(cleanup::run_pipeline(&paragraphs.join("\n")))
    }

    fn name(&self) -> &str {
        "docx"
    }
}

/// Concatenate the text runs of a paragraph. Runs split mid-sentence, so no separator.
fn paragraph_text(para: &Paragraph) -> String {
    let mut out = String::new();
    for child in &para.children {
        if let ParagraphChild::Run(run) = child {
            for rc in &run.children {
                match rc {
                    RunChild::Text(t) => out.push_str(&t.text),
                    RunChild::Tab(_) => out.push('\t'),
                    RunChild::Break(_) => out.push('\n'),
                    _ => {}
                }
            }
        }
    }
    out
}
