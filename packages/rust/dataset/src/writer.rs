//! Dataset file naming and writing.

use std::path::{Path, PathBuf};

use tracing::info;
use traingen_shared::{OutputFormat, Result, TrainGenError, TrainingRecord};

use crate::formatter::serialize;

/// Suffix appended to the source file stem.
const OUTPUT_SUFFIX: &str = "_training";

/// `<dir>/<stem>_training.<ext>` next to the source document.
pub fn output_path(source: &Path, format: OutputFormat) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".into());
    let file_name = format!("{stem}{OUTPUT_SUFFIX}.{}", format.extension());

    match source.parent() {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// Serialize `records` and write them next to `source`. Returns the written path.
pub async fn write_dataset(
    source: &Path,
    records: &[TrainingRecord],
    format: OutputFormat,
) -> Result<PathBuf> {
    let path = output_path(source, format);
    let body = serialize(records, format)?;

    tokio::fs::write(&path, body)
        .await
        .map_err(|e| TrainGenError::io(&path, e))?;

    info!(path = %path.display(), records = records.len(), %format, "dataset written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_naming() {
        let cases = [
            ("docs/report.pdf", OutputFormat::Jsonl, "docs/report_training.jsonl"),
            ("notes.md", OutputFormat::Text, "notes_training.txt"),
            ("a/b/page.html", OutputFormat::Chatml, "a/b/page_training.json"),
            ("data.v2.docx", OutputFormat::Csv, "data.v2_training.csv"),
        ];
        for (source, format, expected) in cases {
            assert_eq!(output_path(Path::new(source), format), PathBuf::from(expected));
        }
    }

    #[tokio::test]
    async fn write_dataset_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("book.txt");
        let records = vec![TrainingRecord::Text {
            text: "hello".into(),
        }];

        let written = write_dataset(&source, &records, OutputFormat::Jsonl)
            .await
            .unwrap();
        assert_eq!(written, dir.path().join("book_training.jsonl"));
        assert_eq!(std::fs::read_to_string(&written).unwrap(), r#"{"text":"hello"}"#);
    }

    #[tokio::test]
    async fn write_into_missing_directory_fails_with_io() {
        let source = Path::new("/nonexistent-dir/for/traingen/book.txt");
        let err = write_dataset(source, &[], OutputFormat::Json).await.unwrap_err();
        assert!(matches!(err, TrainGenError::Io { .. }));
    }
}
