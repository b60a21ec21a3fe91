use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use log::{debug, warn};
use reqwest::Client;
use scraper::{Html, Node, Selector};
use std::time::Duration;

use crate::errors::FetchError;
use crate::text::{collapse_whitespace, truncate_chars};

const TRUNCATION_MARKER: &str = "...[truncated]";
const UNKNOWN_TITLE: &str = "Unknown Title";
const SKIPPED_ELEMENTS: [&str; 3] = ["script", "style", "noscript"];

lazy_static! {
    static ref TITLE_SELECTOR: Selector = Selector::parse("title").expect("valid title selector");
}

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub title: String,
    /// Sanitized plain text, already bounded by the fetcher.
    pub text: String,
    pub markup: String,
    pub status: u16,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum FetchResult {
    Page(FetchedPage),
    Failed(FetchError),
}

impl FetchResult {
    pub fn into_page(self) -> Result<FetchedPage, FetchError> {
        match self {
            FetchResult::Page(page) => Ok(page),
            FetchResult::Failed(error) => Err(error),
        }
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchResult;
}

pub struct HttpFetcher {
    client: Client,
    max_page_chars: usize,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, max_page_chars: usize) -> Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self {
            client,
            max_page_chars,
        })
    }

    async fn fetch_page(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::client(url, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let markup = response
            .text()
            .await
            .map_err(|e| FetchError::client(url, e))?;
        let (title, text) = sanitize_html(&markup);

        Ok(FetchedPage {
            url: url.to_string(),
            title,
            text: truncate_chars(&text, self.max_page_chars, TRUNCATION_MARKER),
            markup,
            status: status.as_u16(),
            fetched_at: Utc::now(),
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchResult {
        debug!("Fetching {}", url);
        let outcome = match tokio::time::timeout(timeout, self.fetch_page(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
            }),
        };

        match outcome {
            Ok(page) => {
                debug!("Fetched {} ({} chars)", url, page.text.len());
                FetchResult::Page(page)
            }
            Err(error) => {
                warn!("{}", error);
                FetchResult::Failed(error)
            }
        }
    }
}

/// Title and visible text of a document, one collapsed text chunk per line.
pub fn sanitize_html(markup: &str) -> (String, String) {
    let document = Html::parse_document(markup);

    let title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string());

    let chunks: Vec<String> = document
        .root_element()
        .descendants()
        .filter_map(|node| match node.value() {
            Node::Text(text) => {
                let hidden = node.ancestors().any(|ancestor| {
                    ancestor
                        .value()
                        .as_element()
                        .map(|el| SKIPPED_ELEMENTS.contains(&el.name()) || el.name() == "title")
                        .unwrap_or(false)
                });
                if hidden {
                    None
                } else {
                    Some(collapse_whitespace(text))
                }
            }
            _ => None,
        })
        .filter(|chunk| !chunk.is_empty())
        .collect();

    (title, chunks.join("\n"))
}
