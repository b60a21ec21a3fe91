use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::ConfigError;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssistantConfig {
    pub ollama_url: String,
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub inference_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
    /// Sanitized page text is cut at this many characters by the fetcher.
    pub max_page_chars: usize,
    /// Per-source text budget inside the synthesis prompt.
    pub max_source_chars: usize,
    pub initial_max_sites: usize,
    /// Sources fetched at once during one gathering pass. Results are still merged in priority order.
    pub fetch_concurrency: usize,
    pub output_dir: PathBuf,
    pub log_level: String,
    pub user_agent: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434".to_string(),
            model: None,
            temperature: 0.7,
            max_tokens: 2048,
            inference_timeout_secs: 60,
            fetch_timeout_secs: 10,
            max_page_chars: 10_000,
            max_source_chars: 5_000,
            initial_max_sites: 8,
            fetch_concurrency: 1,
            output_dir: default_output_dir(),
            log_level: "info".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl AssistantConfig {
    /// Load from `path` (or `~/.ollama_agent/config.json`); a missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(|source| ConfigError::Io {
            path: config_path.clone(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: config_path,
            source,
        })
    }

    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("OLLAMA_HOST") {
            self.ollama_url = normalize_ollama_url(&host);
        }
        if let Some(model) = lookup("OLLAMA_MODEL").filter(|m| !m.trim().is_empty()) {
            self.model = Some(model);
        }
        if let Some(dir) = lookup("ASSISTANT_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(level) = lookup("ASSISTANT_LOG") {
            self.set_log_level(&level)?;
        }
        Ok(())
    }

    pub fn set_log_level(&mut self, level: &str) -> Result<(), ConfigError> {
        let level = level.trim().to_lowercase();
        if ["trace", "debug", "info", "warn", "error", "off"].contains(&level.as_str()) {
            self.log_level = level;
            Ok(())
        } else {
            Err(ConfigError::InvalidValue {
                key: "log_level".to_string(),
                value: level,
            })
        }
    }

    pub fn inference_timeout(&self) -> Duration {
        Duration::from_secs(self.inference_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".ollama_agent").join("config.json"))
}

fn default_output_dir() -> PathBuf {
    dirs::document_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Documents")))
        .unwrap_or_else(|| PathBuf::from("Documents"))
}

/// `OLLAMA_HOST` is often given without a scheme (`127.0.0.1:11434`).
fn normalize_ollama_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}
