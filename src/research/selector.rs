use lazy_static::lazy_static;
use log::info;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::client::{generate_or_none, Inference};
use crate::research::category::{Category, CategoryResolution};
use crate::research::query::SearchQuery;
use crate::research::sources::SourceTables;
use crate::research::SourceCandidate;
use crate::text::KeywordSet;

lazy_static! {
    static ref DETECTED_CATEGORY: Regex = Regex::new(r"CATEGORY:\s*([\w ]+)").expect("valid category regex");
    static ref STRUCTURED_URL: Regex = Regex::new(r#"https?://[^\s"'>]+"#).expect("valid url regex");
    static ref LOOSE_URL: Regex = Regex::new(r"https?://[^\s]+").expect("valid url regex");
    static ref ROYALTY_TERMS: KeywordSet =
        KeywordSet::new(&["queen", "king", "royal", "monarch", "prince", "princess", "crown"]);
}

/// Which resolution step produced the candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStep {
    Predefined,
    Suggested,
    SimpleSuggestion,
    SimilarCategory,
    QueryKeywords,
    Generic,
}

#[derive(Debug, Clone)]
pub struct Selection {
    pub candidates: Vec<SourceCandidate>,
    pub step: SelectionStep,
}

impl Selection {
    pub fn urls(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.url.as_str()).collect()
    }
}

fn suggestion_prompt(query: &str, label: &str, max_sites: usize) -> String {
    format!(
        "I need to gather CURRENT and FACTUAL information about: \"{query}\"\n\
         Category: {label}\n\n\
         IMPORTANT: Suggest {max_sites} specific, high-quality websites that would have the MOST RELEVANT, CURRENT, and AUTHORITATIVE information on this EXACT topic.\n\n\
         Your response should be in this format:\n\
         CATEGORY: [brief category name like news, entertainment, technology, etc.]\n\
         WEBSITES:\n\
         https://www.example1.com\n\
         https://www.example2.com\n\
         https://www.example3.org\n\n\
         IMPORTANT GUIDELINES:\n\
         1. Include ONLY the full URL (with https://) and NO specific paths unless absolutely necessary\n\
         2. Choose MAJOR, WELL-KNOWN websites that are most likely to have current information on this topic\n\
         3. For specialized topics, include the most authoritative industry-specific websites\n\
         4. AVOID suggesting websites that might not exist or have limited content\n\
         5. DO NOT include any social media sites unless they are the primary source for this information\n\n\
         DO NOT include any explanations beyond the format specified above.",
        query = query,
        label = label,
        max_sites = max_sites,
    )
}

fn simple_prompt(query: &str, max_sites: usize) -> String {
    format!(
        "What are the top {} websites for information about {}?\nJust list the full URLs with https:// prefix, one per line.",
        max_sites, query
    )
}

fn extract_urls(pattern: &Regex, response: &str) -> Vec<String> {
    pattern
        .find_iter(response)
        .map(|m| m.as_str().trim_end_matches(|c| matches!(c, '.' | ',' | ';' | ')' | ']')))
        .filter(|candidate| {
            Url::parse(candidate)
                .ok()
                .and_then(|parsed| parsed.host_str().map(|host| host.contains('.')))
                .unwrap_or(false)
        })
        .map(str::to_string)
        .collect()
}

pub struct WebsiteSelector<'a> {
    inference: &'a dyn Inference,
    tables: Arc<SourceTables>,
    timeout: Duration,
}

impl<'a> WebsiteSelector<'a> {
    pub fn new(inference: &'a dyn Inference, tables: Arc<SourceTables>, timeout: Duration) -> Self {
        Self {
            inference,
            tables,
            timeout,
        }
    }

    fn finish(&self, urls: Vec<String>, max_sites: usize, step: SelectionStep) -> Selection {
        let mut candidates = SourceCandidate::ranked(urls);
        candidates.truncate(max_sites);
        info!("Selected {} candidate websites ({:?})", candidates.len(), step);
        Selection { candidates, step }
    }

    /// Each step runs only when every earlier step produced no URLs.
    pub async fn select(
        &self,
        query: &SearchQuery,
        resolution: &CategoryResolution,
        max_sites: usize,
    ) -> Selection {
        if let Some(list) = self.tables.predefined(resolution.category) {
            return self.finish(list.to_vec(), max_sites, SelectionStep::Predefined);
        }

        info!("Asking for website suggestions for '{}'", query.text);
        let response = generate_or_none(
            self.inference,
            &suggestion_prompt(&query.text, &resolution.label, max_sites),
            self.timeout,
            "website suggestion",
        )
        .await
        .unwrap_or_default();

        let detected = DETECTED_CATEGORY
            .captures(&response)
            .map(|caps| caps[1].trim().to_lowercase())
            .unwrap_or_default();

        let suggested = extract_urls(&STRUCTURED_URL, &response);
        if !suggested.is_empty() {
            return self.finish(suggested, max_sites, SelectionStep::Suggested);
        }

        if let Some(simple) = generate_or_none(
            self.inference,
            &simple_prompt(&query.text, max_sites),
            self.timeout,
            "simple website suggestion",
        )
        .await
        {
            let urls = extract_urls(&LOOSE_URL, &simple);
            if !urls.is_empty() {
                return self.finish(urls, max_sites, SelectionStep::SimpleSuggestion);
            }
        }

        let similar = Category::similar_to(&detected)
            .into_iter()
            .chain(Category::similar_to(&resolution.label));
        for category in similar {
            if let Some(list) = self.tables.predefined(category) {
                info!("Using predefined sites for similar category '{}'", category);
                return self.finish(list.to_vec(), max_sites, SelectionStep::SimilarCategory);
            }
        }

        if ROYALTY_TERMS.matches(&query.text) || ROYALTY_TERMS.matches(&query.original) {
            if let Some(list) = self.tables.predefined(Category::Royalty) {
                return self.finish(list.to_vec(), max_sites, SelectionStep::QueryKeywords);
            }
        }

        self.finish(self.tables.generic().to_vec(), max_sites, SelectionStep::Generic)
    }
}
