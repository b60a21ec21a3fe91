use lazy_static::lazy_static;
use log::info;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::client::Inference;
use crate::errors::InferenceError;
use crate::tasks::filename::Filename;
use crate::text::{sanitize_filename, truncate_chars};
use crate::writers::FileWriter;

const PREVIEW_CHARS: usize = 100;

lazy_static! {
    /// "Save the following text to notes.txt: Hello world" carries its own content.
    static ref DIRECT_CONTENT: Regex =
        Regex::new(r"(?is)\b(?:following|this)\s+(?:text|content|line|lines)\b[^:]*:\s*(.+)$").expect("valid direct content regex");
}

#[derive(Error, Debug)]
pub enum FileCreationError {
    #[error("Failed to generate content: {0}")]
    Generation(#[from] InferenceError),

    #[error("Generated content for {filename} was empty")]
    EmptyContent { filename: String },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCreation {
    pub filename: String,
    pub file_type: String,
    pub path: PathBuf,
    pub bytes: usize,
    pub preview: String,
    /// Whether the text was taken from the request instead of generated.
    pub direct_content: bool,
    #[serde(skip)]
    pub content: String,
}

/// Content spelled out in the request itself, if any.
pub fn direct_content(text: &str) -> Option<&str> {
    DIRECT_CONTENT
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|content| !content.is_empty())
}

fn generation_prompt(text: &str, filename: &Filename) -> String {
    format!(
        "Generate content for a {} file based on this request:\n\n{}\n\n\
         Return only the file content, without commentary or code fences.",
        filename.extension, text
    )
}

pub struct FileCreator<'a> {
    inference: &'a dyn Inference,
    writer: &'a dyn FileWriter,
    output_dir: &'a Path,
    timeout: Duration,
}

impl<'a> FileCreator<'a> {
    pub fn new(
        inference: &'a dyn Inference,
        writer: &'a dyn FileWriter,
        output_dir: &'a Path,
        timeout: Duration,
    ) -> Self {
        Self {
            inference,
            writer,
            output_dir,
            timeout,
        }
    }

    pub async fn create(&self, text: &str, filename: &Filename) -> Result<FileCreation, FileCreationError> {
        let file_name = sanitize_filename(&filename.file_name());

        let (content, direct) = match direct_content(text) {
            Some(content) => (content.to_string(), true),
            None => {
                info!("Generating content for {}", file_name);
                let generated = self
                    .inference
                    .generate(&generation_prompt(text, filename), self.timeout)
                    .await?;
                (generated.trim().to_string(), false)
            }
        };

        if content.is_empty() {
            return Err(FileCreationError::EmptyContent { filename: file_name });
        }

        let path = self.output_dir.join(&file_name);
        self.writer
            .write(&path, &content)
            .await
            .map_err(|source| FileCreationError::Write {
                path: path.clone(),
                source,
            })?;
        info!("Created {} ({} bytes)", path.display(), content.len());

        Ok(FileCreation {
            filename: file_name,
            file_type: filename.extension.to_lowercase(),
            path,
            bytes: content.len(),
            preview: truncate_chars(&content, PREVIEW_CHARS, "..."),
            direct_content: direct,
            content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryWriter, ScriptedInference};

    fn creator<'a>(inference: &'a ScriptedInference, writer: &'a MemoryWriter) -> FileCreator<'a> {
        FileCreator::new(inference, writer, Path::new("/out"), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn generated_content_is_written_under_output_dir() {
        let inference = ScriptedInference::new().on("Generate content for a txt file", "Once upon a time...\n");
        let writer = MemoryWriter::default();

        let created = creator(&inference, &writer)
            .create("Write a short story about a boy", &Filename::new("Ham", "txt"))
            .await
            .unwrap();

        assert_eq!(created.path, PathBuf::from("/out/Ham.txt"));
        assert_eq!(created.file_type, "txt");
        assert!(!created.direct_content);
        assert_eq!(writer.written(), vec![(PathBuf::from("/out/Ham.txt"), "Once upon a time...".to_string())]);
        assert_eq!(created.preview, "Once upon a time...");
    }

    #[tokio::test]
    async fn long_content_preview_is_cut_at_a_hundred_chars() {
        let story = "The boy walked to the market. ".repeat(10);
        let inference = ScriptedInference::new().on("Generate content for a txt file", &story);
        let writer = MemoryWriter::default();

        let created = creator(&inference, &writer)
            .create("Write a short story about a boy", &Filename::new("Ham", "txt"))
            .await
            .unwrap();

        assert_eq!(created.preview.chars().count(), 103);
        assert!(created.preview.ends_with("..."));
        assert!(story.starts_with(created.preview.trim_end_matches("...")));
    }

    #[tokio::test]
    async fn spelled_out_text_skips_generation() {
        let inference = ScriptedInference::new();
        let writer = MemoryWriter::default();
        let text = "Save the following text to a file named notes.txt: Hello world";

        let created = creator(&inference, &writer)
            .create(text, &Filename::new("notes", "txt"))
            .await
            .unwrap();

        assert!(created.direct_content);
        assert_eq!(created.content, "Hello world");
        assert!(inference.prompts().is_empty());
    }

    #[tokio::test]
    async fn generation_failures_are_reported() {
        let inference = ScriptedInference::new().fail_on("Generate content", InferenceError::Timeout { seconds: 1 });
        let writer = MemoryWriter::default();

        let err = creator(&inference, &writer)
            .create("Write a poem", &Filename::new("poem", "txt"))
            .await
            .unwrap_err();

        assert!(matches!(err, FileCreationError::Generation(InferenceError::Timeout { .. })));
        assert!(writer.written().is_empty());
    }

    #[test]
    fn direct_content_needs_an_explicit_marker() {
        assert_eq!(direct_content("Write this text: line one\nline two"), Some("line one\nline two"));
        assert_eq!(direct_content("Write a poem: about spring"), None);
    }
}
