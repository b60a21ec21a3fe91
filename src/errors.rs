use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single completion call. Always absorbed by the call site.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("Inference timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Inference request failed: {message}")]
    Request { message: String },

    #[error("Inference returned an empty response")]
    EmptyResponse,
}

impl InferenceError {
    pub fn request(source: impl std::fmt::Display) -> Self {
        Self::Request {
            message: source.to_string(),
        }
    }
}

/// Failure of a single page fetch. Logged and skipped by the gatherer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("Timeout error: the request to {url} timed out")]
    Timeout { url: String },

    #[error("Client error for {url}: {message}")]
    Client { url: String, message: String },

    #[error("HTTP error: {status} ({url})")]
    Http { url: String, status: u16 },
}

impl FetchError {
    pub fn client(url: &str, source: impl std::fmt::Display) -> Self {
        Self::Client {
            url: url.to_string(),
            message: source.to_string(),
        }
    }

    pub fn url(&self) -> &str {
        match self {
            FetchError::Timeout { url } => url,
            FetchError::Client { url, .. } => url,
            FetchError::Http { url, .. } => url,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResearchError {
    #[error("Could not gather information about '{query}' from any of the {attempted} provided websites")]
    NoSourcesSucceeded { query: String, attempted: usize },

    #[error("Content was gathered for '{query}' but synthesis failed: {message}")]
    SynthesisFailed { query: String, message: String },

    #[error("Report is not relevant to the query: {reason}")]
    NotRelevant { reason: String },

    #[error("Failed to write {}: {message}", .path.display())]
    Persist { path: PathBuf, message: String },
}

impl ResearchError {
    pub fn persist(path: PathBuf, source: std::io::Error) -> Self {
        Self::Persist {
            path,
            message: source.to_string(),
        }
    }

    /// Recoverable errors hand control to the fallback pass instead of failing the request.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ResearchError::NoSourcesSucceeded { .. } => true,
            ResearchError::SynthesisFailed { .. } => true,
            ResearchError::NotRelevant { .. } => true,
            ResearchError::Persist { .. } => false,
        }
    }

    pub fn to_user_message(&self) -> String {
        match self {
            ResearchError::NoSourcesSucceeded { query, .. } => {
                format!("No information was found about '{}'. None of the selected sources could be read.", query)
            }
            ResearchError::SynthesisFailed { query, .. } => {
                format!("No information was found about '{}'. The gathered content could not be summarized.", query)
            }
            ResearchError::NotRelevant { reason } => {
                format!("The gathered information did not answer the request: {}", reason)
            }
            // Filesystem errors are surfaced verbatim.
            ResearchError::Persist { message, .. } => message.clone(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persist_errors_are_fatal_and_verbatim() {
        let err = ResearchError::persist(
            PathBuf::from("/nowhere/report.txt"),
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Permission denied (os error 13)"),
        );

        assert!(!err.is_recoverable());
        assert_eq!(err.to_user_message(), "Permission denied (os error 13)");
    }

    #[test]
    fn gathering_failures_trigger_fallback() {
        let err = ResearchError::NoSourcesSucceeded {
            query: "tide tables".to_string(),
            attempted: 4,
        };

        assert!(err.is_recoverable());
        assert!(err.to_user_message().contains("No information was found"));
    }

    #[test]
    fn fetch_error_exposes_url() {
        let err = FetchError::Http {
            url: "https://example.org".to_string(),
            status: 503,
        };
        assert_eq!(err.url(), "https://example.org");
        assert_eq!(err.to_string(), "HTTP error: 503 (https://example.org)");
    }
}
