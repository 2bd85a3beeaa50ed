//! Document-to-dataset processing for traingen.
//!
//! Ties the decoder, prompt templates, generation client and dataset
//! formatter together into the per-file and batch pipeline.

pub mod chunker;
pub mod pipeline;
pub mod prompts;

pub use chunker::{Chunk, chunk_spans, chunk_text, estimate_chunks};
pub use pipeline::{
    BatchReport, FileOutcome, FileResult, FileState, Pipeline, ProgressReporter, SilentProgress,
    resolve_model,
};
pub use prompts::{PromptResolver, PromptTemplate, PromptTier, SUPPORTED_LANGUAGES};
