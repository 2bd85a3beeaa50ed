//! Error types for traingen.
//!
//! Library crates use [`TrainGenError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all traingen operations.
#[derive(Debug, thiserror::Error)]
pub enum TrainGenError {
    /// No decoder exists for the declared file type.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat { extension: String },

    /// The document could not be decoded into text (corrupt input, decoder timeout).
    #[error("decode error: {message}")]
    Decode { message: String },

    /// The decoded text is empty or whitespace-only.
    #[error("document contains no text content")]
    EmptyContent,

    /// No prompt template could be resolved at any tier.
    #[error("prompt resolution error: {message}")]
    PromptResolution { message: String },

    /// Generation request failed (non-timeout fault, or retries exhausted on timeout).
    #[error("generation failed after {attempts} attempt(s): {message}")]
    Generation { attempts: u32, message: String },

    /// No usable model on the generation service.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// Network/HTTP error talking to the generation service.
    #[error("network error: {0}")]
    Network(String),

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Invalid input value (unknown task type, bad chunk size, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Dataset serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TrainGenError>;

impl TrainGenError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a decode error from any displayable message.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for TrainGenError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = TrainGenError::config("missing ollama url");
        assert_eq!(err.to_string(), "config error: missing ollama url");

        let err = TrainGenError::Generation {
            attempts: 3,
            message: "operation timed out".into(),
        };
        assert_eq!(
            err.to_string(),
            "generation failed after 3 attempt(s): operation timed out"
        );

        let err = TrainGenError::UnsupportedFormat {
            extension: "xlsx".into(),
        };
        assert!(err.to_string().contains("xlsx"));
    }
}
