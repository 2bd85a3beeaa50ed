//! Request, response and status types for the Ollama HTTP API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Sampling options sent with every generation request.
///
/// `extra` is flattened into the wire `options` object, so any Ollama model
/// parameter (`num_ctx`, `seed`, `repeat_penalty`, ...) can be passed through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateOptions {
    pub temperature: f64,
    /// `None` uses the client's configured default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            top_p: None,
            extra: Map::new(),
        }
    }
}

impl GenerateOptions {
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Add a free-form model parameter.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Outcome of a single generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    /// The model produced a non-empty reply.
    Success { response: String },
    /// The service answered with an explicit error payload.
    Failure { error: String },
}

impl GenerationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn response(&self) -> Option<&str> {
        match self {
            Self::Success { response } => Some(response),
            Self::Failure { .. } => None,
        }
    }
}

/// One installed model as reported by `GET /api/tags`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub modified_at: Option<String>,
}

/// Generation service health snapshot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OllamaStatus {
    pub running: bool,
    pub models: Vec<ModelInfo>,
    pub version: String,
    /// Why the service is considered down.
    pub error: Option<String>,
}

impl OllamaStatus {
    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|m| m.name.as_str())
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
    pub options: WireOptions<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireOptions<'a> {
    pub temperature: f64,
    pub top_p: f64,
    #[serde(flatten)]
    pub extra: &'a Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VersionResponse {
    #[serde(default)]
    pub version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_options_flatten_extra() {
        let opts = GenerateOptions::default()
            .with_extra("num_ctx", 4096)
            .with_extra("seed", 7);
        let req = GenerateRequest {
            model: "llama3.2",
            prompt: "hi",
            stream: false,
            options: WireOptions {
                temperature: opts.temperature,
                top_p: 0.9,
                extra: &opts.extra,
            },
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["temperature"], 0.7);
        assert_eq!(json["options"]["top_p"], 0.9);
        assert_eq!(json["options"]["num_ctx"], 4096);
        assert_eq!(json["options"]["seed"], 7);
    }

    #[test]
    fn tags_response_tolerates_missing_fields() {
        let tags: TagsResponse =
            serde_json::from_str(r#"{"models":[{"name":"mistral:7b","size":123}]}"#).unwrap();
        assert_eq!(tags.models[0].name, "mistral:7b");
        assert_eq!(tags.models[0].size, Some(123));
        assert!(tags.version.is_none());
    }
}
