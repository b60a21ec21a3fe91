use lazy_static::lazy_static;
use log::{debug, info};
use scraper::{Html, Selector};
use std::time::Duration;

use crate::client::{generate_or_none, Inference};
use crate::research::fetcher::FetchedPage;
use crate::text::{collapse_whitespace, dedup_preserving_order, truncate_chars, KeywordSet};

const MAX_HEADLINES_PER_PAGE: usize = 15;
const MAX_SAMPLE_HEADLINES: usize = 5;
const HEADLINE_ATTRIBUTE_HINTS: [&str; 5] = ["headline", "title", "heading", "header", "news-item"];

lazy_static! {
    static ref HEADING_SELECTOR: Selector = Selector::parse("h1, h2, h3").expect("valid heading selector");
    static ref ANY_ELEMENT: Selector = Selector::parse("*").expect("valid universal selector");
    static ref HEADLINE_REQUEST: KeywordSet =
        KeywordSet::new(&["headline", "headlines", "news", "latest", "breaking"]);
}

/// Headlines aggregated over a set of fetched pages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadlineCollection {
    pub headlines: Vec<String>,
    pub sample_headlines: Vec<String>,
    /// Pages that contributed at least one headline, in fetch order.
    pub sources: Vec<String>,
}

impl HeadlineCollection {
    pub fn is_empty(&self) -> bool {
        self.headlines.is_empty()
    }
}

pub fn is_headline_request(text: &str) -> bool {
    HEADLINE_REQUEST.matches(text)
}

fn plausible_headline(text: &str) -> bool {
    let len = text.chars().count();
    len > 10 && len < 200
}

/// Candidate headlines from markup structure alone: heading tags first, then elements whose
/// class or id names a headline-like role.
pub fn extract_headlines(markup: &str) -> Vec<String> {
    let document = Html::parse_document(markup);
    let mut found = Vec::new();

    for heading in document.select(&HEADING_SELECTOR) {
        found.push(collapse_whitespace(&heading.text().collect::<String>()));
    }

    for hint in HEADLINE_ATTRIBUTE_HINTS {
        for attribute in ["class", "id"] {
            for element in document.select(&ANY_ELEMENT) {
                let named = element
                    .value()
                    .attr(attribute)
                    .map(|value| value.to_lowercase().contains(hint))
                    .unwrap_or(false);
                if named {
                    found.push(collapse_whitespace(&element.text().collect::<String>()));
                }
            }
        }
    }

    let mut headlines = dedup_preserving_order(found.into_iter().filter(|h| plausible_headline(h)));
    headlines.truncate(MAX_HEADLINES_PER_PAGE);
    headlines
}

fn headline_prompt(topic: &str, page_text: &str) -> String {
    format!(
        "You are an AI assistant tasked with extracting headlines or key points from a webpage about {}.\n\
         Please extract the main headlines or key points from the following webpage content.\n\
         Return ONLY the headlines or key points, one per line, with no additional text or formatting.\n\n\
         Webpage content:\n{}",
        topic,
        truncate_chars(page_text, 5000, "")
    )
}

/// Markup first; a page whose markup yields nothing is handed to inference once.
pub async fn gather_headlines(
    pages: &[FetchedPage],
    topic: &str,
    inference: &dyn Inference,
    timeout: Duration,
) -> HeadlineCollection {
    let mut all = Vec::new();
    let mut sources = Vec::new();

    for page in pages {
        let from_markup = extract_headlines(&page.markup);
        if !from_markup.is_empty() {
            debug!("{} headlines from markup of {}", from_markup.len(), page.url);
            all.extend(from_markup);
            sources.push(page.url.clone());
            continue;
        }

        let prompt = headline_prompt(topic, &page.text);
        if let Some(response) = generate_or_none(inference, &prompt, timeout, "headline extraction").await {
            let lines: Vec<String> = response
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect();
            if !lines.is_empty() {
                all.extend(lines);
                sources.push(page.url.clone());
            }
        }
    }

    let headlines = dedup_preserving_order(all.into_iter().filter(|h| h.chars().count() > 10));
    info!("Gathered {} headlines about {}", headlines.len(), topic);

    HeadlineCollection {
        sample_headlines: headlines.iter().take(MAX_SAMPLE_HEADLINES).cloned().collect(),
        headlines,
        sources,
    }
}
