//! End-to-end processing: document → chunks → generation → training records.
//!
//! [`Pipeline::process_file`] drives one document through
//! `Decoding → Chunking → Generating → Done | Failed`;
//! [`Pipeline::process_batch`] runs a list of documents strictly in sequence
//! and collects per-file outcomes without ever failing as a whole.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, instrument, warn};
use traingen_dataset::{build_records, write_dataset};
use traingen_decoder::DecoderRegistry;
use traingen_ollama::{GenerateOptions, GenerationResult, TextGenerator};
use traingen_shared::{ProcessOptions, ProcessingStats, Result, TrainGenError, TrainingRecord};

use crate::chunker::chunk_text;
use crate::prompts::PromptResolver;

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Lifecycle of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileState {
    Decoding,
    Chunking,
    /// Generating for chunk `current` (1-based) of `total`.
    Generating { current: usize, total: usize },
    Done { records: usize },
    Failed { error: String },
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called on every state transition of a file.
    fn state(&self, path: &Path, state: &FileState);
    /// Overall completion in percent (0–100) with a short status line.
    fn progress(&self, percent: f64, message: &str);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn state(&self, _path: &Path, _state: &FileState) {}
    fn progress(&self, _percent: f64, _message: &str) {}
}

/// Position of the current file within a batch, for percentage math.
#[derive(Debug, Clone, Copy)]
struct BatchPosition {
    index: usize,
    files: usize,
}

impl BatchPosition {
    const SINGLE: Self = Self { index: 0, files: 1 };

    fn percent(&self, processed: usize, total: usize) -> f64 {
        let within = if total == 0 {
            0.0
        } else {
            processed as f64 / total as f64
        };
        (self.index as f64 + within) / self.files.max(1) as f64 * 100.0
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Output of one successfully processed file.
#[derive(Debug, Clone)]
pub struct FileResult {
    pub path: PathBuf,
    pub records: Vec<TrainingRecord>,
    pub stats: ProcessingStats,
    /// Where the dataset was written, when writing is enabled.
    pub output_path: Option<PathBuf>,
}

/// Per-file entry of a [`BatchReport`].
#[derive(Debug)]
pub enum FileOutcome {
    Success(FileResult),
    Failure { path: PathBuf, error: String },
}

impl FileOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Success(result) => &result.path,
            Self::Failure { path, .. } => path,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn successful(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.successful()
    }

    pub fn total_records(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o {
                FileOutcome::Success(result) => result.records.len(),
                FileOutcome::Failure { .. } => 0,
            })
            .sum()
    }

    /// A batch succeeds when at least one file did.
    pub fn is_success(&self) -> bool {
        self.successful() > 0
    }
}

// ---------------------------------------------------------------------------
// Model selection
// ---------------------------------------------------------------------------

/// Use `requested` if given, else the first model the service reports.
pub async fn resolve_model<G: TextGenerator>(
    requested: Option<&str>,
    generator: &G,
) -> Result<String> {
    if let Some(model) = requested.map(str::trim).filter(|m| !m.is_empty()) {
        return Ok(model.to_string());
    }

    let status = generator.status().await;
    if !status.running {
        return Err(TrainGenError::ModelUnavailable(format!(
            "generation service is not running: {}",
            status.error.as_deref().unwrap_or("unknown error")
        )));
    }

    let model = status.models.into_iter().next().map(|m| m.name).ok_or_else(|| {
        TrainGenError::ModelUnavailable(
            "no models installed, pull one first (e.g. `ollama pull llama3.2`)".into(),
        )
    })?;
    info!(%model, "no model specified, using first available");
    Ok(model)
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Document-to-dataset pipeline over a text generator.
pub struct Pipeline<G> {
    generator: G,
    model: String,
    options: ProcessOptions,
    decoders: DecoderRegistry,
    prompts: PromptResolver,
}

impl<G: TextGenerator> Pipeline<G> {
    pub fn new(generator: G, model: impl Into<String>, options: ProcessOptions) -> Self {
        let decoders = DecoderRegistry::new().with_decode_timeout(options.decode_timeout);
        let prompts = PromptResolver::new(options.prompt_dirs.clone());
        Self {
            generator,
            model: model.into(),
            options,
            decoders,
            prompts,
        }
    }

    /// Replace the decoder registry.
    pub fn with_decoders(mut self, decoders: DecoderRegistry) -> Self {
        self.decoders = decoders;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn options(&self) -> &ProcessOptions {
        &self.options
    }

    /// Process one document.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn process_file(
        &self,
        path: &Path,
        progress: &dyn ProgressReporter,
    ) -> Result<FileResult> {
        self.run_file(path, BatchPosition::SINGLE, progress).await
    }

    /// Process documents one after another, recording each outcome.
    #[instrument(skip_all, fields(files = paths.len(), model = %self.model))]
    pub async fn process_batch(
        &self,
        paths: &[PathBuf],
        progress: &dyn ProgressReporter,
    ) -> BatchReport {
        let files = paths.len();
        let mut report = BatchReport::default();

        for (index, path) in paths.iter().enumerate() {
            let position = BatchPosition { index, files };
            progress.progress(
                position.percent(0, 1),
                &format!("Processing file {}/{files}: {}", index + 1, path.display()),
            );

            match self.run_file(path, position, progress).await {
                Ok(result) => report.outcomes.push(FileOutcome::Success(result)),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "file failed");
                    report.outcomes.push(FileOutcome::Failure {
                        path: path.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            successful = report.successful(),
            failed = report.failed(),
            records = report.total_records(),
            "batch complete"
        );
        report
    }

    async fn run_file(
        &self,
        path: &Path,
        position: BatchPosition,
        progress: &dyn ProgressReporter,
    ) -> Result<FileResult> {
        let outcome = self.run_file_stages(path, position, progress).await;
        match &outcome {
            Ok(result) => progress.state(
                path,
                &FileState::Done {
                    records: result.records.len(),
                },
            ),
            Err(e) => progress.state(
                path,
                &FileState::Failed {
                    error: e.to_string(),
                },
            ),
        }
        outcome
    }

    async fn run_file_stages(
        &self,
        path: &Path,
        position: BatchPosition,
        progress: &dyn ProgressReporter,
    ) -> Result<FileResult> {
        let started = Instant::now();
        let opts = &self.options;

        progress.state(path, &FileState::Decoding);
        let text = self.decoders.decode_file(path).await?;
        if text.trim().is_empty() {
            return Err(TrainGenError::EmptyContent);
        }

        progress.state(path, &FileState::Chunking);
        let chunks = chunk_text(&text, opts.chunk_size);
        if chunks.is_empty() {
            return Err(TrainGenError::validation("document produced no chunks"));
        }
        let total = chunks.len();
        info!(chunks = total, chars = text.chars().count(), "document chunked");
        progress.progress(position.percent(0, total), &format!("Processing {total} chunks"));

        let template = self.prompts.resolve(&opts.language, opts.task_type).await?;
        let gen_options = GenerateOptions::default().with_temperature(opts.temperature);

        let mut records = Vec::new();
        let mut failed_chunks = 0;

        for (i, chunk) in chunks.iter().enumerate() {
            let current = i + 1;
            progress.state(path, &FileState::Generating { current, total });
            progress.progress(
                position.percent(i, total),
                &format!("Processing chunk {current}/{total}"),
            );

            let prompt = template.render(chunk);
            match self.generator.generate(&self.model, &prompt, &gen_options).await {
                Ok(GenerationResult::Success { response }) => {
                    records.extend(build_records(
                        chunk,
                        &response,
                        opts.task_type,
                        opts.output_format,
                    ));
                }
                Ok(GenerationResult::Failure { error }) => {
                    warn!(chunk = current, total, %error, "generation failed, skipping chunk");
                    failed_chunks += 1;
                }
                Err(e) => {
                    warn!(chunk = current, total, error = %e, "generation failed, skipping chunk");
                    failed_chunks += 1;
                }
            }
        }

        progress.progress(position.percent(total, total), "Processing complete");

        let output_path = if opts.write_output {
            Some(write_dataset(path, &records, opts.output_format).await?)
        } else {
            None
        };

        let stats = ProcessingStats {
            total_chunks: total,
            failed_chunks,
            total_records: records.len(),
            source_chars: text.chars().count(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            chunks = stats.total_chunks,
            failed_chunks = stats.failed_chunks,
            records = stats.total_records,
            elapsed_ms = stats.elapsed_ms,
            "file processed"
        );

        Ok(FileResult {
            path: path.to_path_buf(),
            records,
            stats,
            output_path,
        })
    }
}
