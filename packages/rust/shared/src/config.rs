//! Application configuration for traingen.
//!
//! User config lives at `~/.traingen/traingen.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, TrainGenError};
use crate::types::{OutputFormat, TaskType};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "traingen.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".traingen";

/// Standard local Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

// ---------------------------------------------------------------------------
// Config structs (matching traingen.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Processing defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Generation service settings.
    #[serde(default)]
    pub ollama: OllamaSection,

    /// Prompt template lookup.
    #[serde(default)]
    pub prompts: PromptsConfig,

    /// Input limits.
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Model name; when unset the first model reported by the service is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Task type: instruction, conversation, chunking, custom.
    #[serde(default = "default_task_type")]
    pub task_type: String,

    /// Output format: jsonl, json, csv, text, chatml.
    #[serde(default = "default_output_format")]
    pub output_format: String,

    /// Prompt language code.
    #[serde(default = "default_language")]
    pub language: String,

    /// Target chunk size in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            model: None,
            task_type: default_task_type(),
            output_format: default_output_format(),
            language: default_language(),
            chunk_size: default_chunk_size(),
            temperature: default_temperature(),
        }
    }
}

fn default_task_type() -> String {
    "instruction".into()
}
fn default_output_format() -> String {
    "jsonl".into()
}
fn default_language() -> String {
    "en".into()
}
fn default_chunk_size() -> usize {
    2000
}
fn default_temperature() -> f64 {
    0.7
}

/// `[ollama]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaSection {
    /// Base URL of the generation service.
    #[serde(default = "default_ollama_url")]
    pub url: String,

    /// Base request timeout for prompts up to 5000 characters.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Additional attempts after a timed-out request.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed pause between retry attempts.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Nucleus sampling parameter.
    #[serde(default = "default_top_p")]
    pub top_p: f64,
}

impl Default for OllamaSection {
    fn default() -> Self {
        Self {
            url: default_ollama_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            top_p: default_top_p(),
        }
    }
}

fn default_ollama_url() -> String {
    DEFAULT_OLLAMA_URL.into()
}
fn default_timeout_secs() -> u64 {
    300
}
fn default_max_retries() -> u32 {
    2
}
fn default_retry_delay_secs() -> u64 {
    5
}
fn default_top_p() -> f64 {
    0.9
}

/// `[prompts]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptsConfig {
    /// Directories searched in order for `{language}_{task}.txt` templates.
    #[serde(default = "default_prompt_dirs")]
    pub dirs: Vec<String>,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            dirs: default_prompt_dirs(),
        }
    }
}

fn default_prompt_dirs() -> Vec<String> {
    vec!["prompts".into(), "src/prompts".into()]
}

/// `[limits]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Input files above this size are skipped.
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,

    /// Hard ceiling for offloaded document decoding.
    #[serde(default = "default_decode_timeout_secs")]
    pub decode_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size_mb(),
            decode_timeout_secs: default_decode_timeout_secs(),
        }
    }
}

fn default_max_file_size_mb() -> u64 {
    100
}
fn default_decode_timeout_secs() -> u64 {
    30
}

// ---------------------------------------------------------------------------
// Runtime configs (merged from config file + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime settings for the generation client.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Service base URL.
    pub base_url: Url,
    /// Timeout for prompts up to 5000 characters.
    pub timeout: Duration,
    /// Additional attempts after a timeout.
    pub max_retries: u32,
    /// Pause between attempts.
    pub retry_delay: Duration,
    /// Default nucleus sampling parameter.
    pub top_p: f64,
}

impl OllamaConfig {
    /// Replace the base URL, validating it.
    pub fn with_base_url(mut self, url: &str) -> Result<Self> {
        self.base_url = parse_base_url(url)?;
        Ok(self)
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        let section = OllamaSection::default();
        Self {
            base_url: Url::parse(DEFAULT_OLLAMA_URL).expect("default URL is valid"),
            timeout: Duration::from_secs(section.timeout_secs),
            max_retries: section.max_retries,
            retry_delay: Duration::from_secs(section.retry_delay_secs),
            top_p: section.top_p,
        }
    }
}

impl TryFrom<&AppConfig> for OllamaConfig {
    type Error = TrainGenError;

    fn try_from(config: &AppConfig) -> Result<Self> {
        let section = &config.ollama;
        Ok(Self {
            base_url: parse_base_url(&section.url)?,
            timeout: Duration::from_secs(section.timeout_secs),
            max_retries: section.max_retries,
            retry_delay: Duration::from_secs(section.retry_delay_secs),
            top_p: section.top_p,
        })
    }
}

/// Runtime processing options for one batch.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Model to use; `None` means first available.
    pub model: Option<String>,
    pub task_type: TaskType,
    pub output_format: OutputFormat,
    pub language: String,
    /// Target chunk size in characters.
    pub chunk_size: usize,
    pub temperature: f64,
    /// Prompt template search directories, in priority order.
    pub prompt_dirs: Vec<PathBuf>,
    /// Timeout for offloaded decoding.
    pub decode_timeout: Duration,
    /// Write each file's dataset next to its source.
    pub write_output: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for ProcessOptions {
    fn from(config: &AppConfig) -> Self {
        let defaults = &config.defaults;
        let output_format = defaults.output_format.parse().unwrap_or_else(|_| {
            tracing::warn!(
                format = %defaults.output_format,
                "unrecognized output format in config, using jsonl"
            );
            OutputFormat::Jsonl
        });

        let mut prompt_dirs: Vec<PathBuf> =
            config.prompts.dirs.iter().map(PathBuf::from).collect();
        if let Ok(dir) = config_dir() {
            prompt_dirs.push(dir.join("prompts"));
        }

        Self {
            model: defaults.model.clone(),
            task_type: TaskType::from_name_or_default(&defaults.task_type),
            output_format,
            language: defaults.language.clone(),
            chunk_size: defaults.chunk_size,
            temperature: defaults.temperature,
            prompt_dirs,
            decode_timeout: Duration::from_secs(config.limits.decode_timeout_secs),
            write_output: false,
        }
    }
}

/// Parse and validate a generation service base URL.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| TrainGenError::config(format!("invalid ollama URL '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(TrainGenError::config(format!(
            "unsupported URL scheme '{scheme}' for ollama URL '{raw}'"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.traingen/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| TrainGenError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.traingen/traingen.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| TrainGenError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| TrainGenError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| TrainGenError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| TrainGenError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| TrainGenError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
