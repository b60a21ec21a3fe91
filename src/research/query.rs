use chrono::Datelike;
use log::info;
use std::time::Duration;

use crate::client::{generate_or_none, Inference};
use crate::research::category::CategoryResolution;
use crate::text::collapse_whitespace;

/// Search-oriented query text. The raw request is kept alongside for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub original: String,
    pub text: String,
}

impl SearchQuery {
    pub fn verbatim(request: &str) -> Self {
        Self {
            original: request.to_string(),
            text: request.trim().to_string(),
        }
    }

    /// A regenerated query for the same request; the original request is carried over.
    pub fn regenerated(&self, text: String) -> Self {
        Self {
            original: self.original.clone(),
            text,
        }
    }
}

fn optimization_prompt(request: &str, resolution: &CategoryResolution, year: i32) -> String {
    format!(
        "You are a search engine optimization expert tasked with creating the most effective search query to find precise information about: {topic}\n\
         Content category: {category}\n\n\
         Based on the user's request: \"{request}\"\n\n\
         IMPORTANT GUIDELINES:\n\
         1. Create a search query that will find CURRENT, FACTUAL, and SPECIFIC information about this topic\n\
         2. DO NOT include site-specific operators (like site:) in your query\n\
         3. DO include the current year ({year}) for any time-sensitive topics to ensure up-to-date information\n\
         4. Focus on terms that major authoritative websites would use in their content\n\
         5. Include specific technical terms, proper nouns, and industry terminology when relevant\n\
         6. Prioritize terms that would appear in titles and headings of relevant pages\n\n\
         STRUCTURE YOUR QUERY WITH:\n\
         - Primary topic/subject first\n\
         - Specific attributes or qualifiers\n\
         - Time frame indicators ({year}, current, latest, etc.)\n\
         - Content type indicators (guide, review, comparison, analysis, etc.)\n\
         - Authority indicators (expert, official, research, etc.)\n\n\
         Respond with ONLY the optimized query text, no additional text or explanations.",
        topic = resolution.topic,
        category = resolution.label,
        request = request,
        year = year,
    )
}

/// First non-empty line, unquoted, with any `site:` operators removed.
pub fn clean_query(response: &str) -> String {
    let line = response
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default();
    let unquoted = line.trim_matches(|c| c == '"' || c == '\'' || c == '`');
    let words: Vec<&str> = unquoted
        .split_whitespace()
        .filter(|word| !word.to_lowercase().starts_with("site:"))
        .collect();
    collapse_whitespace(&words.join(" "))
}

pub struct QueryOptimizer<'a> {
    inference: &'a dyn Inference,
    timeout: Duration,
}

impl<'a> QueryOptimizer<'a> {
    pub fn new(inference: &'a dyn Inference, timeout: Duration) -> Self {
        Self { inference, timeout }
    }

    /// Falls back to the request verbatim on timeout, error, or an unusable response.
    pub async fn optimize(&self, request: &str, resolution: &CategoryResolution) -> SearchQuery {
        let year = chrono::Local::now().year();
        let prompt = optimization_prompt(request, resolution, year);

        let optimized = generate_or_none(self.inference, &prompt, self.timeout, "query optimization")
            .await
            .map(|response| clean_query(&response))
            .filter(|query| !query.is_empty());

        match optimized {
            Some(text) => {
                info!("Refined query: '{}'", text);
                SearchQuery {
                    original: request.to_string(),
                    text,
                }
            }
            None => {
                info!("Using the request verbatim as the search query");
                SearchQuery::verbatim(request)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::InferenceError;
    use crate::research::category::{Category, ResolutionSource};
    use crate::testing::ScriptedInference;

    fn fishing() -> CategoryResolution {
        CategoryResolution {
            category: Category::Fishing,
            label: "fishing".to_string(),
            topic: "fishing spots in california".to_string(),
            source: ResolutionSource::Keywords,
        }
    }

    #[tokio::test]
    async fn uses_the_optimized_query() {
        let inference = ScriptedInference::new().on(
            "search engine optimization expert",
            "\"best California fishing spots 2026 expert guide site:reddit.com\"\n",
        );
        let optimizer = QueryOptimizer::new(&inference, Duration::from_secs(1));

        let query = optimizer
            .optimize("Find information about the best fishing spots in California", &fishing())
            .await;

        assert_eq!(query.text, "best California fishing spots 2026 expert guide");
        assert_eq!(query.original, "Find information about the best fishing spots in California");
        let prompt = &inference.prompts()[0];
        assert!(prompt.contains("Content category: fishing"));
        assert!(prompt.contains(&chrono::Local::now().year().to_string()));
    }

    #[tokio::test]
    async fn timeout_falls_back_to_the_request() {
        let inference = ScriptedInference::new()
            .fail_on("search engine optimization expert", InferenceError::Timeout { seconds: 1 });
        let optimizer = QueryOptimizer::new(&inference, Duration::from_secs(1));

        let query = optimizer.optimize("  trout lures  ", &fishing()).await;

        assert_eq!(query.text, "trout lures");
    }

    #[test]
    fn clean_query_skips_blank_lines() {
        assert_eq!(clean_query("\n\n  'salmon runs 2026'  \nextra"), "salmon runs 2026");
        assert_eq!(clean_query("site:example.com"), "");
    }
}
