//! In-memory collaborators for unit tests.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use crate::client::Inference;
use crate::errors::{FetchError, InferenceError};
use crate::research::fetcher::{FetchResult, FetchedPage, Fetcher};
use crate::writers::FileWriter;

enum Reply {
    Text(String),
    Fail(InferenceError),
}

/// Answers prompts by the first registered needle they contain. Unmatched prompts fail.
#[derive(Default)]
pub struct ScriptedInference {
    rules: Vec<(String, Reply)>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedInference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, needle: &str, response: &str) -> Self {
        self.rules
            .push((needle.to_string(), Reply::Text(response.to_string())));
        self
    }

    pub fn fail_on(mut self, needle: &str, error: InferenceError) -> Self {
        self.rules.push((needle.to_string(), Reply::Fail(error)));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn prompts_containing(&self, needle: &str) -> usize {
        self.prompts().iter().filter(|p| p.contains(needle)).count()
    }
}

#[async_trait]
impl Inference for ScriptedInference {
    async fn generate(&self, prompt: &str, _timeout: Duration) -> Result<String, InferenceError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.rules.iter().find(|(needle, _)| prompt.contains(needle.as_str())) {
            Some((_, Reply::Text(text))) => Ok(text.clone()),
            Some((_, Reply::Fail(error))) => Err(error.clone()),
            None => Err(InferenceError::request("no scripted response")),
        }
    }
}

pub fn page(url: &str, text: &str, markup: &str) -> FetchedPage {
    FetchedPage {
        url: url.to_string(),
        title: format!("Title of {}", url),
        text: text.to_string(),
        markup: markup.to_string(),
        status: 200,
        fetched_at: Utc::now(),
    }
}

/// Serves registered pages; every other URL is a 404.
#[derive(Default)]
pub struct MapFetcher {
    pages: HashMap<String, FetchedPage>,
    fetched: Mutex<Vec<String>>,
}

impl MapFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, text: &str) -> Self {
        let markup = format!("<html><body><p>{}</p></body></html>", text);
        self.pages.insert(url.to_string(), page(url, text, &markup));
        self
    }

    pub fn with_markup(mut self, url: &str, text: &str, markup: &str) -> Self {
        self.pages.insert(url.to_string(), page(url, text, markup));
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for MapFetcher {
    async fn fetch(&self, url: &str, _timeout: Duration) -> FetchResult {
        self.fetched.lock().unwrap().push(url.to_string());
        match self.pages.get(url) {
            Some(page) => FetchResult::Page(page.clone()),
            None => FetchResult::Failed(FetchError::Http {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

/// Keeps written files in memory.
#[derive(Default)]
pub struct MemoryWriter {
    files: Mutex<Vec<(PathBuf, String)>>,
}

impl MemoryWriter {
    pub fn written(&self) -> Vec<(PathBuf, String)> {
        self.files.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileWriter for MemoryWriter {
    async fn write(&self, path: &Path, content: &str) -> std::io::Result<()> {
        self.files
            .lock()
            .unwrap()
            .push((path.to_path_buf(), content.to_string()));
        Ok(())
    }
}
