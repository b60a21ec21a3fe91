use log::info;
use std::path::{Path, PathBuf};

use crate::errors::ResearchError;
use crate::research::category::CategoryResolution;
use crate::tasks::filename::Filename;
use crate::text::sanitize_filename;
use crate::writers::FileWriter;

const SOURCES_MARKERS: [&str; 4] = ["sources:", "## sources", "# sources", "source list"];

#[derive(Debug, Clone, PartialEq)]
pub struct PersistedArtifact {
    pub path: PathBuf,
    pub content: String,
}

pub fn has_sources_section(body: &str) -> bool {
    let lower = body.to_lowercase();
    SOURCES_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Appends a numbered `## Sources` list unless the body already has a sources section.
pub fn ensure_sources_section(body: &str, sources: &[String]) -> String {
    if sources.is_empty() || has_sources_section(body) {
        return body.to_string();
    }

    let mut content = body.trim_end().to_string();
    content.push_str("\n\n## Sources\n\n");
    for (i, url) in sources.iter().enumerate() {
        content.push_str(&format!("{}. {}\n", i + 1, url));
    }
    content
}

/// `{stem}_{first three words longer than two characters}.txt`, restricted to `[A-Za-z0-9_.-]`.
pub fn derive_filename(query: &str, resolution: &CategoryResolution) -> String {
    let words: Vec<String> = query
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|word| word.chars().count() > 2)
        .take(3)
        .collect();

    let stem = resolution.filename_stem();
    let name = if words.is_empty() {
        format!("{}.txt", stem)
    } else {
        format!("{}_{}.txt", stem, words.join("_"))
    };
    sanitize_filename(&name)
}

pub struct ResultPersister<'a> {
    writer: &'a dyn FileWriter,
    output_dir: &'a Path,
}

impl<'a> ResultPersister<'a> {
    pub fn new(writer: &'a dyn FileWriter, output_dir: &'a Path) -> Self {
        Self { writer, output_dir }
    }

    pub fn target_path(
        &self,
        suggested: Option<&Filename>,
        query: &str,
        resolution: &CategoryResolution,
    ) -> PathBuf {
        let file_name = match suggested {
            Some(name) => sanitize_filename(&name.file_name()),
            None => derive_filename(query, resolution),
        };
        self.output_dir.join(file_name)
    }

    /// Writes once, replacing any existing file. Filesystem errors are fatal.
    pub async fn persist(
        &self,
        body: &str,
        sources_used: &[String],
        suggested: Option<&Filename>,
        query: &str,
        resolution: &CategoryResolution,
    ) -> Result<PersistedArtifact, ResearchError> {
        let path = self.target_path(suggested, query, resolution);
        let content = ensure_sources_section(body, sources_used);

        self.writer
            .write(&path, &content)
            .await
            .map_err(|e| ResearchError::persist(path.clone(), e))?;

        info!("Saved research report to {}", path.display());
        Ok(PersistedArtifact { path, content })
    }
}
