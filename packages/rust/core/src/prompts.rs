//! Prompt template resolution.
//!
//! A template is looked up as `{language}_{task}.txt` in each search
//! directory in turn, then as `en_{task}.txt`, and finally falls back to the
//! built-in template for the task.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use traingen_shared::{Result, TaskType, TrainGenError};

/// Placeholder replaced by the chunk text.
pub const PLACEHOLDER: &str = "{{text}}";

/// Language used for the second lookup tier.
pub const FALLBACK_LANGUAGE: &str = "en";

/// Languages the built-in CLI advertises. Other codes still work if a template file exists.
pub const SUPPORTED_LANGUAGES: [&str; 8] = ["en", "zh-Hans", "zh-Hant", "es", "fr", "de", "ja", "ko"];

const INSTRUCTION_TEMPLATE: &str = include_str!("../templates/instruction.txt");
const CONVERSATION_TEMPLATE: &str = include_str!("../templates/conversation.txt");
const CHUNKING_TEMPLATE: &str = include_str!("../templates/chunking.txt");
const CUSTOM_TEMPLATE: &str = include_str!("../templates/custom.txt");

/// Built-in template for a task type.
pub fn builtin_template(task_type: TaskType) -> &'static str {
    match task_type {
        TaskType::Instruction => INSTRUCTION_TEMPLATE,
        TaskType::Conversation => CONVERSATION_TEMPLATE,
        TaskType::Chunking => CHUNKING_TEMPLATE,
        TaskType::Custom => CUSTOM_TEMPLATE,
    }
}

/// Which lookup tier produced a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptTier {
    /// File for the requested language.
    Exact,
    /// File for the fallback language.
    EnglishFallback,
    /// Compiled-in default.
    Hardcoded,
}

/// A resolved prompt template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    pub content: String,
    /// Requested language code.
    pub language: String,
    pub task_type: TaskType,
    pub tier: PromptTier,
    /// File the template was read from, if any.
    pub source: Option<PathBuf>,
}

impl PromptTemplate {
    pub fn is_fallback(&self) -> bool {
        self.tier != PromptTier::Exact
    }

    pub fn has_placeholder(&self) -> bool {
        self.content.contains(PLACEHOLDER)
    }

    /// Substitute the first placeholder with `chunk`.
    pub fn render(&self, chunk: &str) -> String {
        self.content.replacen(PLACEHOLDER, chunk, 1)
    }
}

/// Resolves templates from an ordered list of directories.
#[derive(Debug, Clone)]
pub struct PromptResolver {
    dirs: Vec<PathBuf>,
}

impl PromptResolver {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Resolve the template for `language` and `task_type`.
    pub async fn resolve(&self, language: &str, task_type: TaskType) -> Result<PromptTemplate> {
        let mut found = self
            .find_file(language, task_type)
            .await
            .map(|(path, content)| (PromptTier::Exact, Some(path), content));

        if found.is_none() && language != FALLBACK_LANGUAGE {
            found = self
                .find_file(FALLBACK_LANGUAGE, task_type)
                .await
                .map(|(path, content)| (PromptTier::EnglishFallback, Some(path), content));
        }

        let (tier, source, content) = found.unwrap_or_else(|| {
            (
                PromptTier::Hardcoded,
                None,
                builtin_template(task_type).to_string(),
            )
        });

        if content.trim().is_empty() {
            return Err(TrainGenError::PromptResolution {
                message: format!("no usable template for {language}/{task_type}"),
            });
        }

        let template = PromptTemplate {
            content,
            language: language.to_string(),
            task_type,
            tier,
            source,
        };

        if !template.has_placeholder() {
            warn!(
                language,
                task = %task_type,
                source = ?template.source,
                "prompt template has no text placeholder, chunks will not be inserted"
            );
        }
        info!(language, task = %task_type, tier = ?template.tier, "prompt template resolved");
        Ok(template)
    }

    async fn find_file(&self, language: &str, task_type: TaskType) -> Option<(PathBuf, String)> {
        if !is_safe_language(language) {
            debug!(language, "language code is not a plain name, skipping file lookup");
            return None;
        }

        let file_name = format!("{language}_{}.txt", task_type.as_str());
        for dir in &self.dirs {
            let path = dir.join(&file_name);
            match read_template(&path).await {
                Some(content) => return Some((path, content)),
                None => continue,
            }
        }
        None
    }
}

impl Default for PromptResolver {
    fn default() -> Self {
        let mut dirs = vec![PathBuf::from("prompts"), PathBuf::from("src/prompts")];
        if let Ok(config_dir) = traingen_shared::config_dir() {
            dirs.push(config_dir.join("prompts"));
        }
        Self::new(dirs)
    }
}

async fn read_template(path: &Path) -> Option<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) if content.trim().is_empty() => {
            debug!(path = %path.display(), "empty prompt template, skipping");
            None
        }
        Ok(content) => Some(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "unreadable prompt template, skipping");
            None
        }
    }
}

fn is_safe_language(language: &str) -> bool {
    !language.is_empty()
        && language
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn builtin_templates_carry_placeholder() {
        for task in TaskType::ALL {
            assert!(builtin_template(task).contains(PLACEHOLDER), "{task}");
        }
        assert!(builtin_template(TaskType::Instruction).contains("Question:"));
        assert!(builtin_template(TaskType::Conversation).contains("Assistant:"));
    }

    #[test]
    fn render_replaces_first_placeholder_only() {
        let template = PromptTemplate {
            content: "A {{text}} B {{text}}".into(),
            language: "en".into(),
            task_type: TaskType::Custom,
            tier: PromptTier::Exact,
            source: None,
        };
        assert_eq!(template.render("chunk"), "A chunk B {{text}}");
    }

    #[tokio::test]
    async fn exact_match_wins() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "fr_instruction.txt", "FR {{text}}");
        write(dir.path(), "en_instruction.txt", "EN {{text}}");

        let resolver = PromptResolver::new(vec![dir.path().to_path_buf()]);
        let template = resolver.resolve("fr", TaskType::Instruction).await.unwrap();
        assert_eq!(template.tier, PromptTier::Exact);
        assert!(!template.is_fallback());
        assert_eq!(template.render("x"), "FR x");
        assert_eq!(template.source, Some(dir.path().join("fr_instruction.txt")));
    }

    #[tokio::test]
    async fn earlier_directory_takes_priority() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        write(first.path(), "en_chunking.txt", "first {{text}}");
        write(second.path(), "en_chunking.txt", "second {{text}}");

        let resolver = PromptResolver::new(vec![
            PathBuf::from("/nonexistent/prompts"),
            first.path().to_path_buf(),
            second.path().to_path_buf(),
        ]);
        let template = resolver.resolve("en", TaskType::Chunking).await.unwrap();
        assert_eq!(template.render("x"), "first x");
    }

    #[tokio::test]
    async fn falls_back_to_english_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "en_conversation.txt", "EN {{text}}");

        let resolver = PromptResolver::new(vec![dir.path().to_path_buf()]);
        let template = resolver.resolve("ja", TaskType::Conversation).await.unwrap();
        assert_eq!(template.tier, PromptTier::EnglishFallback);
        assert!(template.is_fallback());
        assert_eq!(template.language, "ja");
    }

    #[tokio::test]
    async fn falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = PromptResolver::new(vec![dir.path().to_path_buf()]);

        let template = resolver.resolve("de", TaskType::Custom).await.unwrap();
        assert_eq!(template.tier, PromptTier::Hardcoded);
        assert_eq!(template.content, builtin_template(TaskType::Custom));
        assert!(template.source.is_none());
    }

    #[tokio::test]
    async fn template_without_placeholder_is_used_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "en_custom.txt", "Static prompt");

        let resolver = PromptResolver::new(vec![dir.path().to_path_buf()]);
        let template = resolver.resolve("en", TaskType::Custom).await.unwrap();
        assert!(!template.has_placeholder());
        assert_eq!(template.render("ignored"), "Static prompt");
    }

    #[tokio::test]
    async fn empty_template_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "en_instruction.txt", "   \n");

        let resolver = PromptResolver::new(vec![dir.path().to_path_buf()]);
        let template = resolver.resolve("en", TaskType::Instruction).await.unwrap();
        assert_eq!(template.tier, PromptTier::Hardcoded);
    }

    #[tokio::test]
    async fn path_like_language_skips_file_lookup() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "en_instruction.txt", "EN {{text}}");

        let resolver = PromptResolver::new(vec![dir.path().join("sub")]);
        let template = resolver.resolve("../en", TaskType::Instruction).await.unwrap();
        assert_eq!(template.tier, PromptTier::Hardcoded);
    }
}
