//! Training record construction and dataset serialization.

use tracing::debug;
use traingen_shared::{
    ChatMessage, OutputFormat, RecordShape, Result, Role, TaskType, TrainingRecord,
};

use crate::parser::{parse_pairs, parse_turns};

/// Instruction text for records built from question/answer pairs.
pub const ANSWER_INSTRUCTION: &str = "Answer the question based on the text";
/// Instruction text for records built from conversation turns.
pub const RESPOND_INSTRUCTION: &str = "Respond to the user's message";
/// Instruction text for unstructured fallback records of non-instruction tasks.
pub const PROCESS_INSTRUCTION: &str = "Process the following text";

/// Build training records from one chunk and the model's reply to it.
///
/// Structured items are extracted according to the task; when none are
/// found a single record pairing the chunk with the raw reply is emitted.
pub fn build_records(
    input_text: &str,
    model_output: &str,
    task_type: TaskType,
    output_format: OutputFormat,
) -> Vec<TrainingRecord> {
    let shape = output_format.record_shape();

    match task_type {
        TaskType::Instruction => {
            let pairs = parse_pairs(model_output);
            if !pairs.is_empty() {
                debug!(pairs = pairs.len(), "extracted question/answer pairs");
                return pairs
                    .into_iter()
                    .map(|p| shape_record(shape, ANSWER_INSTRUCTION, p.question, p.answer))
                    .collect();
            }
        }
        TaskType::Conversation => {
            let turns = parse_turns(model_output);
            if !turns.is_empty() {
                debug!(turns = turns.len(), "extracted conversation turns");
                if shape == RecordShape::Chat {
                    let messages = turns
                        .into_iter()
                        .flat_map(|t| [ChatMessage::user(t.user), ChatMessage::assistant(t.assistant)])
                        .collect();
                    return vec![TrainingRecord::Chat { messages }];
                }
                return turns
                    .into_iter()
                    .map(|t| shape_record(shape, RESPOND_INSTRUCTION, t.user, t.assistant))
                    .collect();
            }
        }
        TaskType::Chunking | TaskType::Custom => {}
    }

    let instruction = if task_type == TaskType::Instruction {
        ANSWER_INSTRUCTION
    } else {
        PROCESS_INSTRUCTION
    };
    vec![shape_record(
        shape,
        instruction,
        input_text.to_string(),
        model_output.to_string(),
    )]
}

fn shape_record(
    shape: RecordShape,
    instruction: &str,
    input: String,
    output: String,
) -> TrainingRecord {
    match shape {
        RecordShape::Instruction => TrainingRecord::Instruction {
            instruction: instruction.to_string(),
            input,
            output,
        },
        RecordShape::Chat => TrainingRecord::Chat {
            messages: vec![ChatMessage::user(input), ChatMessage::assistant(output)],
        },
        RecordShape::Text => TrainingRecord::Text { text: output },
        RecordShape::Tabular => TrainingRecord::Tabular { input, output },
    }
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

/// Encode records as a dataset file body.
pub fn serialize(records: &[TrainingRecord], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Jsonl => {
            let lines = records
                .iter()
                .map(serde_json::to_string)
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(lines.join("\n"))
        }
        OutputFormat::Json | OutputFormat::Chatml => Ok(serde_json::to_string_pretty(records)?),
        OutputFormat::Csv => Ok(to_csv(records)),
        OutputFormat::Text => Ok(records
            .iter()
            .map(text_of)
            .collect::<Vec<_>>()
            .join("\n\n")),
    }
}

/// Decode a `json` or `chatml` dataset body.
pub fn deserialize_json(body: &str) -> Result<Vec<TrainingRecord>> {
    Ok(serde_json::from_str(body)?)
}

fn to_csv(records: &[TrainingRecord]) -> String {
    if records.is_empty() {
        return String::new();
    }

    let mut out = String::from("input,output");
    for record in records {
        out.push('\n');
        out.push_str(&csv_field(record.input()));
        out.push(',');
        out.push_str(&csv_field(record.output()));
    }
    out
}

fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Plain-text view of a record. Chat records contribute every assistant message.
fn text_of(record: &TrainingRecord) -> String {
    match record {
        TrainingRecord::Chat { messages } => messages
            .iter()
            .filter(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n"),
        other => other.output().to_string(),
    }
}
