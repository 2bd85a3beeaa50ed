//! HTTP client for a local Ollama-compatible generation service.
//!
//! Covers the three operations the pipeline needs: a health/status check
//! (`/api/tags` + `/api/version`), a best-effort model warm-up probe
//! (`/api/show`), and non-streaming text generation (`/api/generate`) with an
//! adaptive timeout and a bounded timeout-only retry policy.

mod types;

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};
use traingen_shared::{OllamaConfig, Result, TrainGenError};
use url::Url;

pub use types::{
    DEFAULT_TEMPERATURE, GenerateOptions, GenerationResult, ModelInfo, OllamaStatus,
};
use types::{GenerateRequest, GenerateResponse, TagsResponse, VersionResponse, WireOptions};

/// User-Agent string for service requests.
const USER_AGENT: &str = concat!("traingen/", env!("CARGO_PKG_VERSION"));

/// Connection establishment ceiling, independent of the request timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const TAGS_TIMEOUT: Duration = Duration::from_secs(5);
const VERSION_TIMEOUT: Duration = Duration::from_secs(3);
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Prompts longer than this (in characters) get the medium timeout.
const MEDIUM_PROMPT_CHARS: usize = 5_000;
/// Prompts longer than this get the long timeout.
const LONG_PROMPT_CHARS: usize = 10_000;
const MEDIUM_PROMPT_TIMEOUT: Duration = Duration::from_secs(450);
const LONG_PROMPT_TIMEOUT: Duration = Duration::from_secs(600);

/// Request timeout for a prompt of `prompt_chars` characters.
pub fn timeout_for_prompt(prompt_chars: usize, base: Duration) -> Duration {
    if prompt_chars > LONG_PROMPT_CHARS {
        LONG_PROMPT_TIMEOUT
    } else if prompt_chars > MEDIUM_PROMPT_CHARS {
        MEDIUM_PROMPT_TIMEOUT
    } else {
        base
    }
}

// ---------------------------------------------------------------------------
// TextGenerator
// ---------------------------------------------------------------------------

/// Abstraction over a text generation backend.
///
/// The pipeline is generic over this trait; [`OllamaClient`] is the
/// production implementation.
pub trait TextGenerator: Send + Sync {
    /// Generate a reply for `prompt` using `model`.
    fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerateOptions,
    ) -> impl Future<Output = Result<GenerationResult>> + Send;

    /// Report service health and installed models. Never fails.
    fn status(&self) -> impl Future<Output = OllamaStatus> + Send;
}

// ---------------------------------------------------------------------------
// OllamaClient
// ---------------------------------------------------------------------------

/// Failure of one generation attempt, classified for the retry policy.
enum AttemptError {
    Timeout(String),
    Fatal(String),
}

impl AttemptError {
    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else {
            Self::Fatal(e.to_string())
        }
    }
}

/// Client for the Ollama HTTP API.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: Client,
    config: OllamaConfig,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| TrainGenError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.as_str().trim_end_matches('/'))
    }

    /// Check whether the service is up, which models it has, and its version.
    #[instrument(skip_all, fields(url = %self.config.base_url))]
    pub async fn status(&self) -> OllamaStatus {
        let tags: TagsResponse = match self.get_json("api/tags", TAGS_TIMEOUT).await {
            Ok(tags) => tags,
            Err(e) => {
                debug!(error = %e, "generation service unreachable");
                return OllamaStatus {
                    running: false,
                    models: Vec::new(),
                    version: "unknown".into(),
                    error: Some(e.to_string()),
                };
            }
        };

        let version = match self
            .get_json::<VersionResponse>("api/version", VERSION_TIMEOUT)
            .await
        {
            Ok(VersionResponse {
                version: Some(version),
            }) => version,
            Ok(_) => "unknown".into(),
            Err(e) => {
                debug!(error = %e, "version endpoint unavailable, using tags payload");
                tags.version.unwrap_or_else(|| "unknown".into())
            }
        };

        OllamaStatus {
            running: true,
            models: tags.models,
            version,
            error: None,
        }
    }

    /// First model reported by the service, if any.
    pub async fn default_model(&self) -> Option<String> {
        self.status().await.models.into_iter().next().map(|m| m.name)
    }

    /// Generate a reply, retrying only on timeouts.
    ///
    /// Returns `Ok(GenerationResult::Failure)` when the service answers with an
    /// explicit error payload, and `Err(Generation)` for transport faults,
    /// unexpected payloads, or exhausted timeout retries.
    #[instrument(skip_all, fields(model = %model, prompt_chars = tracing::field::Empty))]
    pub async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<GenerationResult> {
        let prompt_chars = prompt.chars().count();
        tracing::Span::current().record("prompt_chars", prompt_chars);

        let timeout = timeout_for_prompt(prompt_chars, self.config.timeout);
        let max_attempts = self.config.max_retries + 1;

        self.spawn_model_probe(model);

        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!(attempt, max_attempts, timeout_secs = timeout.as_secs(), "sending generation request");

            match self.generate_once(model, prompt, options, timeout).await {
                Ok(result) => {
                    if attempt > 1 {
                        info!(attempt, "generation succeeded after retry");
                    }
                    return Ok(result);
                }
                Err(AttemptError::Timeout(message)) if attempt < max_attempts => {
                    warn!(attempt, max_attempts, error = %message, "generation timed out, retrying");
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(AttemptError::Timeout(message) | AttemptError::Fatal(message)) => {
                    return Err(TrainGenError::Generation {
                        attempts: attempt,
                        message,
                    });
                }
            }
        }
    }

    async fn generate_once(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerateOptions,
        timeout: Duration,
    ) -> std::result::Result<GenerationResult, AttemptError> {
        let body = GenerateRequest {
            model,
            prompt,
            stream: false,
            options: WireOptions {
                temperature: options.temperature,
                top_p: options.top_p.unwrap_or(self.config.top_p),
                extra: &options.extra,
            },
        };

        let response = self
            .http
            .post(self.endpoint("api/generate"))
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(AttemptError::from_reqwest)?;

        let status = response.status();
        let text = response.text().await.map_err(AttemptError::from_reqwest)?;
        let parsed: Option<GenerateResponse> = serde_json::from_str(&text).ok();

        if let Some(error) = parsed.as_ref().and_then(|p| p.error.clone()) {
            warn!(%status, %error, "generation service reported an error");
            return Ok(GenerationResult::Failure { error });
        }
        if !status.is_success() {
            return Err(AttemptError::Fatal(format!("HTTP {status}")));
        }

        let parsed = parsed.ok_or_else(|| {
            AttemptError::Fatal("malformed response body from generation service".into())
        })?;
        match parsed.response {
            Some(response) if !response.is_empty() => {
                Ok(GenerationResult::Success { response })
            }
            _ => Err(AttemptError::Fatal(
                "generation service returned an empty response".into(),
            )),
        }
    }

    /// Fire-and-forget `GET /api/show` so the service starts loading the model.
    fn spawn_model_probe(&self, model: &str) {
        let request = self
            .http
            .get(self.endpoint("api/show"))
            .query(&[("name", model)])
            .timeout(PROBE_TIMEOUT);
        let model = model.to_string();

        tokio::spawn(async move {
            if let Err(e) = request.send().await {
                debug!(%model, error = %e, "model probe failed");
            }
        });
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, timeout: Duration) -> Result<T> {
        let url = self.endpoint(path);
        let response = self
            .http
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| TrainGenError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrainGenError::Network(format!("{url}: HTTP {status}")));
        }

        response
            .json()
            .await
            .map_err(|e| TrainGenError::Network(format!("{url}: invalid JSON: {e}")))
    }
}

impl TextGenerator for OllamaClient {
    fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerateOptions,
    ) -> impl Future<Output = Result<GenerationResult>> + Send {
        OllamaClient::generate(self, model, prompt, options)
    }

    fn status(&self) -> impl Future<Output = OllamaStatus> + Send {
        OllamaClient::status(self)
    }
}
