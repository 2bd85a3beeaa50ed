//! traingen CLI: turn documents into AI fine-tuning datasets.
//!
//! Extracts text from PDF, DOCX, DOC, RTF, TXT, Markdown and HTML files,
//! sends it chunk by chunk through a local Ollama model, and writes the
//! parsed replies as JSONL, JSON, CSV, plain text or ChatML datasets.

mod commands;

use std::future::Future;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

/// How long blocking workers get to finish once the command has returned.
/// Decodes abandoned after a timeout are cut off here.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    block_on_runtime(commands::run(cli))?
}

/// Drive `future` on a fresh multi-threaded runtime, then shut it down
/// without waiting on blocking workers past [`SHUTDOWN_GRACE`].
fn block_on_runtime<F: Future>(future: F) -> std::io::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let output = runtime.block_on(future);
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Instant;

    use traingen_decoder::{DecoderRegistry, DocumentDecoder};
    use traingen_shared::{FileType, TrainGenError};

    use super::*;

    struct HangingDecoder;

    impl DocumentDecoder for HangingDecoder {
        fn decode(&self, _bytes: &[u8]) -> traingen_shared::Result<String> {
            std::thread::sleep(Duration::from_secs(5));
            Ok(String::new())
        }

        fn name(&self) -> &str {
            "hanging"
        }
    }

    #[test]
    fn timed_out_decode_does_not_hold_runtime_shutdown() {
        let registry = DecoderRegistry::new()
            .with_offload_threshold(1)
            .with_decode_timeout(Duration::from_millis(50))
            .with_decoder(FileType::Pdf, Arc::new(HangingDecoder));

        let started = Instant::now();
        let outcome = block_on_runtime(async move {
            registry.decode(b"%PDF-1.7".to_vec(), FileType::Pdf).await
        })
        .unwrap();

        assert!(matches!(outcome, Err(TrainGenError::Decode { .. })));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn runtime_returns_future_output() {
        let value = block_on_runtime(async { 40 + 2 }).unwrap();
        assert_eq!(value, 42);
    }
}
