//! Lazily initialised decoder registry with blocking-worker offload.

use std::path::Path;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument};
use traingen_shared::{FileType, Result, TrainGenError};

use crate::decoders::{DocumentDecoder, build_decoder};

/// Binary inputs at or above this size are decoded on a blocking worker.
pub const OFFLOAD_THRESHOLD_BYTES: usize = 5 * 1024 * 1024;

/// Default ceiling on an offloaded decode.
pub const DEFAULT_DECODE_TIMEOUT: Duration = Duration::from_secs(30);

/// Holds one decoder per [`FileType`], each constructed on first use.
pub struct DecoderRegistry {
    slots: [OnceLock<Arc<dyn DocumentDecoder>>; FileType::ALL.len()],
    offload_threshold: usize,
    decode_timeout: Duration,
}

impl DecoderRegistry {
    /// Create an empty registry. No decoder is built until it is needed.
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| OnceLock::new()),
            offload_threshold: OFFLOAD_THRESHOLD_BYTES,
            decode_timeout: DEFAULT_DECODE_TIMEOUT,
        }
    }

    pub fn with_decode_timeout(mut self, timeout: Duration) -> Self {
        self.decode_timeout = timeout;
        self
    }

    pub fn with_offload_threshold(mut self, bytes: usize) -> Self {
        self.offload_threshold = bytes;
        self
    }

    /// Install a decoder for a type ahead of first use.
    ///
    /// Has no effect if that type's decoder was already initialised.
    pub fn with_decoder(self, file_type: FileType, decoder: Arc<dyn DocumentDecoder>) -> Self {
        let _ = self.slots[file_type as usize].set(decoder);
        self
    }

    /// Whether the decoder for `file_type` has been constructed yet.
    pub fn is_loaded(&self, file_type: FileType) -> bool {
        self.slots[file_type as usize].get().is_some()
    }

    /// Get (constructing if needed) the decoder for `file_type`.
    pub fn decoder(&self, file_type: FileType) -> Arc<dyn DocumentDecoder> {
        self.slots[file_type as usize]
            .get_or_init(|| {
                debug!(file_type = %file_type, "initialising decoder");
                build_decoder(file_type)
            })
            .clone()
    }

    /// Decode `bytes` as `file_type`.
    ///
    /// Large binary inputs run on `spawn_blocking` under the decode timeout;
    /// on timeout the worker is abandoned and a `Decode` error is returned.
    /// Callers owning the runtime should shut it down with a timeout so an
    /// abandoned worker cannot delay exit.
    #[instrument(skip_all, fields(file_type = %file_type, bytes = bytes.len()))]
    pub async fn decode(&self, bytes: Vec<u8>, file_type: FileType) -> Result<String> {
        let decoder = self.decoder(file_type);
        let started = Instant::now();

        let text = if file_type.is_binary() && bytes.len() >= self.offload_threshold {
            info!(decoder = decoder.name(), "offloading decode to blocking worker");
            tokio::time::timeout(
                self.decode_timeout,
                tokio::task::spawn_blocking(move || decoder.decode(&bytes)),
            )
            .await
            .map_err(|_| {
                TrainGenError::decode(format!(
                    "{file_type} decoding timed out after {}s",
                    self.decode_timeout.as_secs_f64()
                ))
            })?
            .map_err(|e| TrainGenError::decode(format!("decode worker failed: {e}")))??
        } else {
            decoder.decode(&bytes)?
        };

        debug!(
            chars = text.chars().count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "decode complete"
        );
        Ok(text)
    }

    /// Read a file and decode it according to its extension.
    pub async fn decode_file(&self, path: &Path) -> Result<String> {
        let file_type = FileType::from_path(path)?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| TrainGenError::io(path, e))?;
        self.decode(bytes, file_type).await
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowDecoder(Duration);

    impl DocumentDecoder for SlowDecoder {
        fn decode(&self, _bytes: &[u8]) -> Result<String> {
            std::thread::sleep(self.0);
            Ok("slow text".into())
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    #[test]
    fn decoders_are_built_on_first_use() {
        let registry = DecoderRegistry::new();
        assert!(FileType::ALL.iter().all(|t| !registry.is_loaded(*t)));

        registry.decoder(FileType::Html);
        assert!(registry.is_loaded(FileType::Html));
        assert!(!registry.is_loaded(FileType::Pdf));
    }

    #[tokio::test]
    async fn decodes_small_text_inline() {
        let registry = DecoderRegistry::new();
        let text = registry
            .decode(b"hello  world\n".to_vec(), FileType::Txt)
            .await
            .unwrap();
        assert_eq!(text, "hello world");
    }

    #[tokio::test]
    async fn offloaded_decode_times_out() {
        let registry = DecoderRegistry::new()
            .with_offload_threshold(4)
            .with_decode_timeout(Duration::from_millis(50))
            .with_decoder(FileType::Pdf, Arc::new(SlowDecoder(Duration::from_millis(500))));

        let err = registry
            .decode(b"%PDF-1.7".to_vec(), FileType::Pdf)
            .await
            .unwrap_err();
        assert!(matches!(err, TrainGenError::Decode { .. }));
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn offloaded_decode_within_timeout_succeeds() {
        let registry = DecoderRegistry::new()
            .with_offload_threshold(4)
            .with_decoder(FileType::Rtf, Arc::new(SlowDecoder(Duration::from_millis(10))));

        let text = registry
            .decode(b"{\\rtf1 x}".to_vec(), FileType::Rtf)
            .await
            .unwrap();
        assert_eq!(text, "slow text");
    }

    #[tokio::test]
    async fn text_formats_never_offload() {
        let registry = DecoderRegistry::new()
            .with_offload_threshold(1)
            .with_decode_timeout(Duration::from_millis(1))
            .with_decoder(FileType::Md, Arc::new(SlowDecoder(Duration::from_millis(20))));

        let text = registry.decode(b"# md".to_vec(), FileType::Md).await.unwrap();
        assert_eq!(text, "slow text");
    }

    #[tokio::test]
    async fn decode_file_uses_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<p>Hi <b>there</b></p>").unwrap();

        let registry = DecoderRegistry::new();
        assert_eq!(registry.decode_file(&path).await.unwrap(), "Hi there");

        let unknown = dir.path().join("sheet.xlsx");
        std::fs::write(&unknown, "x").unwrap();
        let err = registry.decode_file(&unknown).await.unwrap_err();
        assert!(matches!(err, TrainGenError::UnsupportedFormat { .. }));
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let registry = DecoderRegistry::new();
        let err = registry
            .decode_file(Path::new("/nonexistent/file.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, TrainGenError::Io { .. }));
    }
}
