//! Shared types, error model, and configuration for traingen.
//!
//! This crate is the foundation depended on by all other traingen crates.
//! It provides:
//! - [`TrainGenError`], the unified error type
//! - Domain types ([`TaskType`], [`OutputFormat`], [`FileType`], [`TrainingRecord`])
//! - Configuration ([`AppConfig`], [`ProcessOptions`], [`OllamaConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DEFAULT_OLLAMA_URL, DefaultsConfig, LimitsConfig, OllamaConfig, OllamaSection,
    ProcessOptions, PromptsConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from, parse_base_url,
};
pub use error::{Result, TrainGenError};
pub use types::{
    ChatMessage, FileType, OutputFormat, ProcessingStats, RecordShape, Role, TaskType,
    TrainingRecord,
};
