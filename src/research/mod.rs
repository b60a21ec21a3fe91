pub mod category;
pub mod fallback;
pub mod fetcher;
pub mod gatherer;
pub mod headlines;
pub mod persist;
pub mod pipeline;
pub mod prioritizer;
pub mod query;
pub mod relevance;
pub mod selector;
pub mod sources;

use serde::Serialize;

use crate::text::dedup_preserving_order;

pub use category::{Category, CategoryResolution, CategoryResolver};
pub use fetcher::{FetchResult, FetchedPage, Fetcher, HttpFetcher};
pub use pipeline::{ResearchPipeline, ResearchReport};
pub use query::SearchQuery;
pub use sources::SourceTables;

/// A URL considered for gathering. Rank 1 is fetched first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceCandidate {
    pub url: String,
    pub rank: usize,
}

impl SourceCandidate {
    /// Deduplicate preserving order and number from 1.
    pub fn ranked<I>(urls: I) -> Vec<SourceCandidate>
    where
        I: IntoIterator<Item = String>,
    {
        dedup_preserving_order(urls)
            .into_iter()
            .enumerate()
            .map(|(index, url)| SourceCandidate { url, rank: index + 1 })
            .collect()
    }

    pub fn urls(candidates: &[SourceCandidate]) -> Vec<String> {
        candidates.iter().map(|c| c.url.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranked_candidates_are_unique_and_ordered() {
        let candidates = SourceCandidate::ranked(vec![
            "https://a.example".to_string(),
            "https://b.example".to_string(),
            "https://a.example".to_string(),
        ]);

        assert_eq!(
            candidates,
            vec![
                SourceCandidate { url: "https://a.example".to_string(), rank: 1 },
                SourceCandidate { url: "https://b.example".to_string(), rank: 2 },
            ]
        );
    }
}
