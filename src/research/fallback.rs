use lazy_static::lazy_static;
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::client::{generate_or_none, Inference};
use crate::errors::ResearchError;
use crate::research::category::Category;
use crate::research::gatherer::{GatherOutcome, InformationGatherer};
use crate::research::query::{clean_query, SearchQuery};
use crate::research::sources::SourceTables;
use crate::research::SourceCandidate;
use crate::text::KeywordSet;

lazy_static! {
    /// Query terms that pick a backup list when the category alone does not.
    static ref BACKUP_HINTS: Vec<(Category, KeywordSet)> = vec![
        (Category::Entertainment, KeywordSet::new(&["actor", "actors", "actress", "movie", "movies", "film", "films", "tv", "television", "celebrity"])),
        (Category::News, KeywordSet::new(&["news", "current events", "headlines", "breaking"])),
        (Category::Tech, KeywordSet::new(&["technology", "smartphone", "computer", "gadget", "software", "ai", "artificial intelligence"])),
        (Category::Sports, KeywordSet::new(&["sports", "football", "basketball", "baseball", "soccer", "nfl", "nba", "mlb", "nhl"])),
        (Category::Health, KeywordSet::new(&["health", "medical", "disease", "treatment", "medicine", "fitness", "nutrition"])),
        (Category::Finance, KeywordSet::new(&["finance", "money", "invest", "investing", "stock", "stocks", "market", "economy", "financial"])),
        (Category::Travel, KeywordSet::new(&["travel", "vacation", "destination", "tourism", "hotel", "flight"])),
    ];
}

/// Result of the single fallback pass.
#[derive(Debug, Clone)]
pub struct FallbackAttempt {
    pub query: SearchQuery,
    pub sources: Vec<SourceCandidate>,
    pub result: Result<GatherOutcome, ResearchError>,
}

impl FallbackAttempt {
    /// A successful pass with a non-empty body.
    pub fn usable(&self) -> Option<&GatherOutcome> {
        self.result
            .as_ref()
            .ok()
            .filter(|outcome| !outcome.report.body.trim().is_empty())
    }
}

fn generalize_prompt(query: &str) -> String {
    format!(
        "The search query \"{}\" didn't yield useful results.\n\
         Please create a more general version of this query that would work better on general knowledge websites.\n\
         Focus on the core information need while removing any overly specific constraints.\n\
         Return ONLY the revised query text, no explanations.",
        query
    )
}

pub struct FallbackCoordinator<'a> {
    inference: &'a dyn Inference,
    tables: Arc<SourceTables>,
    timeout: Duration,
}

impl<'a> FallbackCoordinator<'a> {
    pub fn new(inference: &'a dyn Inference, tables: Arc<SourceTables>, timeout: Duration) -> Self {
        Self {
            inference,
            tables,
            timeout,
        }
    }

    /// Broader query text; the current query is kept when inference gives nothing usable.
    pub async fn generalize(&self, query: &SearchQuery) -> SearchQuery {
        let generalized = generate_or_none(
            self.inference,
            &generalize_prompt(&query.text),
            self.timeout,
            "query generalization",
        )
        .await
        .map(|response| clean_query(&response))
        .filter(|text| !text.is_empty());

        match generalized {
            Some(text) => {
                info!("Fallback query: '{}'", text);
                query.regenerated(text)
            }
            None => query.clone(),
        }
    }

    /// Backup list for a specific category, else one picked by query terms, else the general list.
    pub fn backup_sources(&self, category: Category, query: &str) -> Vec<SourceCandidate> {
        let by_category = match category {
            Category::General => None,
            specific => self.tables.backup(specific),
        };
        let by_hint = || {
            BACKUP_HINTS
                .iter()
                .find(|(_, hints)| hints.matches(query))
                .and_then(|(hinted, _)| self.tables.backup(*hinted))
        };

        let list = by_category
            .or_else(by_hint)
            .unwrap_or_else(|| self.tables.general_backup());
        SourceCandidate::ranked(list.iter().cloned())
    }

    /// One generalized gathering pass over backup sources. Never retries.
    pub async fn run(
        &self,
        gatherer: &InformationGatherer<'_>,
        query: &SearchQuery,
        category: Category,
    ) -> FallbackAttempt {
        warn!("Initial attempt failed, trying fallback approach for: '{}'", query.text);

        let generalized = self.generalize(query).await;
        let sources = self.backup_sources(category, &query.text);
        info!("Fallback gathering from {} backup websites", sources.len());

        let result = gatherer.gather(&sources, &generalized).await;
        if let Err(e) = &result {
            warn!("Fallback attempt failed: {}", e);
        }

        FallbackAttempt {
            query: generalized,
            sources,
            result,
        }
    }
}
