//! Core domain types for traingen datasets.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TrainGenError;

// ---------------------------------------------------------------------------
// TaskType
// ---------------------------------------------------------------------------

/// Processing task applied to every chunk. Selects the prompt template and the
/// structured-extraction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    /// Question/answer pairs for instruction tuning.
    #[default]
    Instruction,
    /// User/assistant dialogue.
    Conversation,
    /// Dense summary, no extraction structure.
    Chunking,
    /// Structured-analysis narrative, no extraction structure.
    Custom,
}

impl TaskType {
    pub const ALL: [TaskType; 4] = [
        Self::Instruction,
        Self::Conversation,
        Self::Chunking,
        Self::Custom,
    ];

    /// Name used in prompt file names and config values.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Instruction => "instruction",
            Self::Conversation => "conversation",
            Self::Chunking => "chunking",
            Self::Custom => "custom",
        }
    }

    /// Lenient parse: unrecognized names fall back to [`TaskType::Instruction`].
    pub fn from_name_or_default(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            tracing::warn!(task = name, "unrecognized task type, using instruction");
            Self::Instruction
        })
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = TrainGenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "instruction" => Ok(Self::Instruction),
            "conversation" => Ok(Self::Conversation),
            "chunking" => Ok(Self::Chunking),
            "custom" => Ok(Self::Custom),
            other => Err(TrainGenError::validation(format!(
                "unknown task type '{other}': expected instruction, conversation, chunking, or custom"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// OutputFormat
// ---------------------------------------------------------------------------

/// Shape of a single training record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordShape {
    Instruction,
    Chat,
    Text,
    Tabular,
}

/// Serialized dataset encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jsonl,
    Json,
    Csv,
    Text,
    Chatml,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 5] = [
        Self::Jsonl,
        Self::Json,
        Self::Csv,
        Self::Text,
        Self::Chatml,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jsonl => "jsonl",
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Text => "text",
            Self::Chatml => "chatml",
        }
    }

    /// File extension for datasets written in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jsonl => "jsonl",
            Self::Json | Self::Chatml => "json",
            Self::Csv => "csv",
            Self::Text => "txt",
        }
    }

    /// Record shape emitted for this format.
    pub fn record_shape(&self) -> RecordShape {
        match self {
            Self::Chatml => RecordShape::Chat,
            Self::Text => RecordShape::Text,
            Self::Csv => RecordShape::Tabular,
            Self::Jsonl | Self::Json => RecordShape::Instruction,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = TrainGenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jsonl" => Ok(Self::Jsonl),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "text" | "txt" => Ok(Self::Text),
            "chatml" => Ok(Self::Chatml),
            other => Err(TrainGenError::validation(format!(
                "unknown output format '{other}': expected jsonl, json, csv, text, or chatml"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// FileType
// ---------------------------------------------------------------------------

/// Declared type of an input document, taken from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Pdf,
    Docx,
    Doc,
    Rtf,
    Txt,
    Md,
    Html,
}

impl FileType {
    pub const ALL: [FileType; 7] = [
        Self::Pdf,
        Self::Docx,
        Self::Doc,
        Self::Rtf,
        Self::Txt,
        Self::Md,
        Self::Html,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Doc => "doc",
            Self::Rtf => "rtf",
            Self::Txt => "txt",
            Self::Md => "md",
            Self::Html => "html",
        }
    }

    /// Case-insensitive lookup by extension (without the dot).
    pub fn from_extension(ext: &str) -> Result<Self, TrainGenError> {
        let lower = ext.trim_start_matches('.').to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == lower)
            .ok_or(TrainGenError::UnsupportedFormat { extension: lower })
    }

    /// Determine the file type from a path's extension.
    pub fn from_path(path: &Path) -> Result<Self, TrainGenError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(ext)
    }

    /// Binary container formats whose decoding is CPU-heavy.
    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Pdf | Self::Docx | Self::Doc | Self::Rtf)
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TrainingRecord
// ---------------------------------------------------------------------------

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One `{role, content}` turn of a chat record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// One structured example in the output dataset.
///
/// Variant order matters for untagged deserialization: the instruction shape
/// must be tried before the tabular shape it is a superset of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrainingRecord {
    Instruction {
        instruction: String,
        input: String,
        output: String,
    },
    Chat {
        messages: Vec<ChatMessage>,
    },
    Tabular {
        input: String,
        output: String,
    },
    Text {
        text: String,
    },
}

impl TrainingRecord {
    /// The prompt side of the record (chat: first message).
    pub fn input(&self) -> &str {
        match self {
            Self::Instruction { input, .. } | Self::Tabular { input, .. } => input,
            Self::Chat { messages } => messages.first().map_or("", |m| m.content.as_str()),
            Self::Text { .. } => "",
        }
    }

    /// The completion side of the record (chat: second message, text: the text).
    pub fn output(&self) -> &str {
        match self {
            Self::Instruction { output, .. } | Self::Tabular { output, .. } => output,
            Self::Chat { messages } => messages.get(1).map_or("", |m| m.content.as_str()),
            Self::Text { text } => text,
        }
    }
}

// ---------------------------------------------------------------------------
// ProcessingStats
// ---------------------------------------------------------------------------

/// Per-file aggregate computed once processing finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProcessingStats {
    /// Number of chunks the document was split into.
    pub total_chunks: usize,
    /// Chunks skipped because generation failed.
    pub failed_chunks: usize,
    /// Number of training records produced.
    pub total_records: usize,
    /// Character count of the decoded source text.
    pub source_chars: usize,
    /// Wall-clock processing time.
    pub elapsed_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_type_parsing() {
        assert_eq!("Conversation".parse::<TaskType>().unwrap(), TaskType::Conversation);
        assert!("summarize".parse::<TaskType>().is_err());
        assert_eq!(TaskType::from_name_or_default("summarize"), TaskType::Instruction);
        assert_eq!(TaskType::from_name_or_default("custom"), TaskType::Custom);
    }

    #[test]
    fn output_format_extensions_and_shapes() {
        assert_eq!(OutputFormat::Text.extension(), "txt");
        assert_eq!(OutputFormat::Chatml.extension(), "json");
        assert_eq!(OutputFormat::Jsonl.record_shape(), RecordShape::Instruction);
        assert_eq!(OutputFormat::Csv.record_shape(), RecordShape::Tabular);
        assert_eq!(OutputFormat::Chatml.record_shape(), RecordShape::Chat);
    }

    #[test]
    fn file_type_from_path() {
        assert_eq!(FileType::from_path(Path::new("a/b/Report.PDF")).unwrap(), FileType::Pdf);
        assert_eq!(FileType::from_path(Path::new("notes.md")).unwrap(), FileType::Md);

        let err = FileType::from_path(Path::new("sheet.xlsx")).unwrap_err();
        assert!(matches!(err, TrainGenError::UnsupportedFormat { ref extension } if extension == "xlsx"));
        assert!(FileType::from_path(Path::new("no_extension")).is_err());
    }

    #[test]
    fn record_serializes_by_shape() {
        let record = TrainingRecord::Instruction {
            instruction: "Answer the question based on the text".into(),
            input: "Q".into(),
            output: "A".into(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"instruction":"Answer the question based on the text","input":"Q","output":"A"}"#
        );

        let chat = TrainingRecord::Chat {
            messages: vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")],
        };
        let json = serde_json::to_string(&chat).unwrap();
        assert_eq!(
            json,
            r#"{"messages":[{"role":"user","content":"hi"},{"role":"assistant","content":"hello"}]}"#
        );
    }

    #[test]
    fn record_untagged_deserialization_picks_right_shape() {
        let tabular: TrainingRecord =
            serde_json::from_str(r#"{"input":"q","output":"a"}"#).unwrap();
        assert!(matches!(tabular, TrainingRecord::Tabular { .. }));

        let instruction: TrainingRecord =
            serde_json::from_str(r#"{"instruction":"i","input":"q","output":"a"}"#).unwrap();
        assert!(matches!(instruction, TrainingRecord::Instruction { .. }));

        let text: TrainingRecord = serde_json::from_str(r#"{"text":"t"}"#).unwrap();
        assert_eq!(text.output(), "t");
    }

    #[test]
    fn record_accessors() {
        let chat = TrainingRecord::Chat {
            messages: vec![ChatMessage::user("u"), ChatMessage::assistant("a")],
        };
        assert_eq!(chat.input(), "u");
        assert_eq!(chat.output(), "a");

        let empty = TrainingRecord::Chat { messages: vec![] };
        assert_eq!(empty.input(), "");
        assert_eq!(empty.output(), "");
    }
}
