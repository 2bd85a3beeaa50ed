//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use traingen_core::{
    BatchReport, FileOutcome, FileState, Pipeline, ProgressReporter, SUPPORTED_LANGUAGES,
    SilentProgress, resolve_model,
};
use traingen_ollama::{OllamaClient, OllamaStatus};
use traingen_shared::{
    AppConfig, FileType, OllamaConfig, OutputFormat, ProcessOptions, TaskType, init_config,
    load_config,
};

const BYTES_PER_MB: u64 = 1024 * 1024;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// traingen: turn documents into AI training datasets.
#[derive(Parser)]
#[command(
    name = "traingen",
    version,
    about = "Generate fine-tuning datasets from documents using a local Ollama model.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Process documents into a training dataset (one output file per input).
    Process(ProcessArgs),

    /// Check the Ollama service and list installed models.
    Status {
        /// Ollama base URL (overrides config).
        #[arg(long, env = "TRAINGEN_OLLAMA_URL")]
        ollama_url: Option<String>,
    },

    /// List supported input formats, output formats and prompt languages.
    ListFormats,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags for `traingen process`. Unset flags fall back to the config file.
#[derive(clap::Args, Debug)]
pub(crate) struct ProcessArgs {
    /// Input documents.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Model name (defaults to the first installed model).
    #[arg(short, long)]
    pub model: Option<String>,

    /// Task type: instruction, conversation, chunking, custom.
    #[arg(short = 't', long = "type")]
    pub task_type: Option<TaskType>,

    /// Output format: jsonl, json, csv, text, chatml.
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// Prompt language code (e.g. en, zh-Hans, ja).
    #[arg(short, long)]
    pub language: Option<String>,

    /// Target chunk size in characters.
    #[arg(short, long)]
    pub chunk_size: Option<usize>,

    /// Sampling temperature.
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Ollama base URL (overrides config).
    #[arg(long, env = "TRAINGEN_OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Disable the progress bar.
    #[arg(long)]
    pub no_progress: bool,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file at ~/.traingen/traingen.toml.
    Init,
    /// Show current configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "traingen=info",
        1 => "traingen=debug",
        _ => "traingen=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Process(args) => cmd_process(args).await,
        Command::Status { ollama_url } => cmd_status(ollama_url.as_deref()).await,
        Command::ListFormats => cmd_list_formats(),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_process(args: ProcessArgs) -> Result<()> {
    let config = load_config()?;
    let client = OllamaClient::new(ollama_config(&config, args.ollama_url.as_deref())?)?;

    let status = client.status().await;
    if !status.running {
        print_service_down(&status);
        return Err(eyre!("Ollama is not reachable at {}", client.base_url()));
    }
    println!("Ollama {} at {}", status.version, client.base_url());

    let mut options = process_options(&config, &args)?;
    let model = resolve_model(options.model.as_deref(), &client).await?;
    options.model = Some(model.clone());

    let max_bytes = config.limits.max_file_size_mb.saturating_mul(BYTES_PER_MB);
    let (files, skipped) = select_inputs(&args.files, max_bytes);
    for (path, reason) in &skipped {
        warn!(path = %path.display(), %reason, "skipping input");
        eprintln!("  skipped {}: {reason}", path.display());
    }
    if files.is_empty() {
        return Err(eyre!("no processable input files"));
    }

    info!(
        files = files.len(),
        %model,
        task = %options.task_type,
        format = %options.output_format,
        "starting batch"
    );
    println!(
        "Processing {} file(s) with {model} ({} / {} / {})",
        files.len(),
        options.task_type,
        options.output_format,
        options.language
    );

    let pipeline = Pipeline::new(client, model, options);
    let report = if args.no_progress {
        pipeline.process_batch(&files, &SilentProgress).await
    } else {
        let reporter = CliProgress::new();
        let report = pipeline.process_batch(&files, &reporter).await;
        reporter.finish();
        report
    };

    print_summary(&report);

    if report.is_success() {
        Ok(())
    } else {
        Err(eyre!("processing failed for all {} file(s)", report.outcomes.len()))
    }
}

async fn cmd_status(ollama_url: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let client = OllamaClient::new(ollama_config(&config, ollama_url)?)?;
    let status = client.status().await;

    if !status.running {
        print_service_down(&status);
        return Err(eyre!("Ollama is not reachable at {}", client.base_url()));
    }

    println!();
    println!("  Ollama:  running");
    println!("  URL:     {}", client.base_url());
    println!("  Version: {}", status.version);
    if status.models.is_empty() {
        println!("  Models:  none installed (try `ollama pull llama3.2`)");
    } else {
        println!("  Models:");
        for model in &status.models {
            match model.size {
                Some(size) => println!("    - {} ({:.1} GB)", model.name, gigabytes(size)),
                None => println!("    - {}", model.name),
            }
        }
    }
    println!();
    Ok(())
}

fn cmd_list_formats() -> Result<()> {
    let config = load_config()?;

    println!("Input formats:");
    for file_type in FileType::ALL {
        println!("  {file_type}");
    }
    println!();
    println!("Output formats:");
    for format in OutputFormat::ALL {
        println!("  {format} (.{})", format.extension());
    }
    println!();
    println!("Task types:");
    for task in TaskType::ALL {
        println!("  {task}");
    }
    println!();
    println!("Prompt languages: {}", SUPPORTED_LANGUAGES.join(", "));
    println!("Max file size: {} MB", config.limits.max_file_size_mb);
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ollama_config(config: &AppConfig, url_override: Option<&str>) -> Result<OllamaConfig> {
    let ollama = OllamaConfig::try_from(config)?;
    Ok(match url_override {
        Some(url) => ollama.with_base_url(url)?,
        None => ollama,
    })
}

/// Merge CLI flags over the config file defaults.
fn process_options(config: &AppConfig, args: &ProcessArgs) -> Result<ProcessOptions> {
    let mut options = ProcessOptions::from(config);

    if let Some(model) = &args.model {
        options.model = Some(model.clone());
    }
    if let Some(task_type) = args.task_type {
        options.task_type = task_type;
    }
    if let Some(format) = args.format {
        options.output_format = format;
    }
    if let Some(language) = &args.language {
        options.language = language.clone();
    }
    if let Some(chunk_size) = args.chunk_size {
        if chunk_size == 0 {
            return Err(eyre!("chunk size must be greater than zero"));
        }
        options.chunk_size = chunk_size;
    }
    if let Some(temperature) = args.temperature {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(eyre!("temperature must be between 0.0 and 2.0, got {temperature}"));
        }
        options.temperature = temperature;
    }
    options.write_output = true;

    Ok(options)
}

/// Split inputs into processable files and skipped ones with a reason.
fn select_inputs(paths: &[PathBuf], max_bytes: u64) -> (Vec<PathBuf>, Vec<(PathBuf, String)>) {
    let mut selected = Vec::new();
    let mut skipped = Vec::new();

    for path in paths {
        match check_input(path, max_bytes) {
            Ok(()) => selected.push(path.clone()),
            Err(reason) => skipped.push((path.clone(), reason)),
        }
    }

    (selected, skipped)
}

fn check_input(path: &Path, max_bytes: u64) -> std::result::Result<(), String> {
    let metadata = std::fs::metadata(path).map_err(|e| format!("cannot access file: {e}"))?;
    if !metadata.is_file() {
        return Err("not a regular file".into());
    }
    FileType::from_path(path).map_err(|e| e.to_string())?;
    if metadata.len() > max_bytes {
        return Err(format!(
            "file is {:.1} MB, limit is {} MB",
            metadata.len() as f64 / BYTES_PER_MB as f64,
            max_bytes / BYTES_PER_MB
        ));
    }
    Ok(())
}

fn gigabytes(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0 * 1024.0)
}

fn print_service_down(status: &OllamaStatus) {
    eprintln!();
    eprintln!("  Ollama is not running.");
    if let Some(error) = &status.error {
        eprintln!("  Error: {error}");
    }
    eprintln!("  Start it with `ollama serve`, or pass --ollama-url.");
    eprintln!();
}

fn print_summary(report: &BatchReport) {
    println!();
    for outcome in &report.outcomes {
        match outcome {
            FileOutcome::Success(result) => {
                let target = result
                    .output_path
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "-".into());
                println!(
                    "  ✓ {} → {target} ({} records, {}/{} chunks failed, {:.1}s)",
                    result.path.display(),
                    result.records.len(),
                    result.stats.failed_chunks,
                    result.stats.total_chunks,
                    result.stats.elapsed_ms as f64 / 1000.0
                );
            }
            FileOutcome::Failure { path, error } => {
                println!("  ✗ {}: {error}", path.display());
            }
        }
    }
    println!();
    println!("  Files:   {} succeeded, {} failed", report.successful(), report.failed());
    println!("  Records: {}", report.total_records());
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif bar.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
                .progress_chars("=> "),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn state(&self, path: &Path, state: &FileState) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match state {
            FileState::Decoding => self.bar.set_message(format!("Extracting {name}")),
            FileState::Chunking => self.bar.set_message(format!("Chunking {name}")),
            FileState::Generating { current, total } => self
                .bar
                .set_message(format!("Generating {name} [{current}/{total}]")),
            FileState::Done { records } => {
                self.bar.println(format!("  ✓ {name}: {records} records"));
            }
            FileState::Failed { error } => {
                self.bar.println(format!("  ✗ {name}: {error}"));
            }
        }
    }

    fn progress(&self, percent: f64, _message: &str) {
        self.bar.set_position(percent.clamp(0.0, 100.0).round() as u64);
    }
}
