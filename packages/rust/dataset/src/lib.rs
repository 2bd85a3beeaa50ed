//! Turning model replies into training datasets.
//!
//! - [`parser`] extracts question/answer pairs and conversation turns
//! - [`formatter`] builds [`TrainingRecord`]s and serializes them
//! - [`writer`] names and writes the dataset file
//!
//! [`TrainingRecord`]: traingen_shared::TrainingRecord

pub mod formatter;
pub mod parser;
pub mod writer;

pub use formatter::{
    ANSWER_INSTRUCTION, PROCESS_INSTRUCTION, RESPOND_INSTRUCTION, build_records,
    deserialize_json, serialize,
};
pub use parser::{ConversationTurn, QaPair, parse_pairs, parse_turns};
pub use writer::{output_path, write_dataset};
