use lazy_static::lazy_static;
use log::{info, warn};
use regex::Regex;
use std::time::Duration;

use crate::client::{generate_or_none, Inference};
use crate::research::SourceCandidate;

const MIN_PRIORITIZED: usize = 3;
const PAD_TARGET: usize = 5;
const MAX_PRIORITIZED: usize = 6;
const PER_BUCKET_FALLBACK: usize = 2;

lazy_static! {
    static ref NUMBERED_URL_LINE: Regex = Regex::new(r"^\d+\.\s*https?://").expect("valid numbered line regex");
    static ref URL: Regex = Regex::new(r"(https?://[^\s]+)").expect("valid url regex");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorityBucket {
    Official,
    News,
    Reference,
    Other,
}

impl AuthorityBucket {
    const ORDER: [AuthorityBucket; 4] = [
        AuthorityBucket::Official,
        AuthorityBucket::News,
        AuthorityBucket::Reference,
        AuthorityBucket::Other,
    ];

    pub fn of(url: &str) -> Self {
        let url = url.to_lowercase();
        let has_any = |patterns: &[&str]| patterns.iter().any(|p| url.contains(p));

        if has_any(&[".gov", ".edu", "official", "association", "org/"]) {
            AuthorityBucket::Official
        } else if has_any(&["news", "bbc", "cnn", "nyt", "reuters", "guardian", "times", "post", "wsj", "bloomberg"]) {
            AuthorityBucket::News
        } else if has_any(&["wikipedia", "britannica", "dictionary", "encyclopedia", "howto", "guide"]) {
            AuthorityBucket::Reference
        } else {
            AuthorityBucket::Other
        }
    }

    fn heading(self) -> &'static str {
        match self {
            AuthorityBucket::Official => "OFFICIAL SOURCES",
            AuthorityBucket::News => "NEWS SOURCES",
            AuthorityBucket::Reference => "REFERENCE SOURCES",
            AuthorityBucket::Other => "OTHER SOURCES",
        }
    }
}

fn bucketize(urls: &[String]) -> Vec<(AuthorityBucket, Vec<String>)> {
    AuthorityBucket::ORDER
        .iter()
        .map(|bucket| {
            let members = urls
                .iter()
                .filter(|url| AuthorityBucket::of(url) == *bucket)
                .cloned()
                .collect();
            (*bucket, members)
        })
        .collect()
}

fn key_terms_prompt(query: &str) -> String {
    format!(
        "Extract 3-5 key terms or concepts from this search query: \"{}\"\n\
         These terms should represent the most important aspects of what the user is looking for.\n\
         Return ONLY a comma-separated list of terms, no explanations.",
        query
    )
}

fn ranking_prompt(query: &str, key_terms: &str, buckets: &[(AuthorityBucket, Vec<String>)]) -> String {
    let listing = buckets
        .iter()
        .map(|(bucket, urls)| {
            let members = if urls.is_empty() {
                "None".to_string()
            } else {
                urls.join(", ")
            };
            format!("{}:\n{}", bucket.heading(), members)
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are a search engine expert tasked with determining which websites are most likely to contain \
         accurate and relevant information for this query: \"{query}\"\n\n\
         The key concepts in this query are: {key_terms}\n\n\
         Here are the potential websites to visit, categorized:\n\n{listing}\n\n\
         Analyze these websites and select the most promising ones based on these criteria:\n\
         - Authority and reliability (prefer well-known, established websites)\n\
         - Specificity to the query (URLs that mention key terms from the query)\n\
         - Recency (websites likely to contain up-to-date information)\n\
         - Diversity (include different types of sources for a comprehensive view)\n\n\
         Return a numbered list of 5-6 websites to visit, in order of priority, with the most promising websites first.\n\
         Format your response as a simple numbered list with no additional text or explanations.\n\
         Example:\n1. https://example.com/relevant-page\n2. https://another-site.org/useful-info",
        query = query,
        key_terms = key_terms,
        listing = listing,
    )
}

/// Numbered URL lines mapped back onto `candidates`; URLs that match no candidate are dropped.
pub fn parse_ranking(response: &str, candidates: &[String]) -> Vec<String> {
    let mut ranked: Vec<String> = Vec::new();

    for line in response.lines().map(str::trim) {
        if !NUMBERED_URL_LINE.is_match(line) {
            continue;
        }
        let Some(found) = URL.captures(line) else {
            continue;
        };
        let url = found[1].trim_end_matches(|c| matches!(c, '.' | ',' | ';'));

        let matched = candidates
            .iter()
            .find(|candidate| candidate.as_str() == url)
            .or_else(|| {
                candidates
                    .iter()
                    .find(|candidate| url.starts_with(candidate.as_str()) || candidate.starts_with(url))
            });

        match matched {
            Some(candidate) if !ranked.contains(candidate) => ranked.push(candidate.clone()),
            Some(_) => {}
            None => warn!("Ignoring ranked URL outside the candidate set: {}", url),
        }
    }

    ranked
}

pub struct SourcePrioritizer<'a> {
    inference: &'a dyn Inference,
    timeout: Duration,
}

impl<'a> SourcePrioritizer<'a> {
    pub fn new(inference: &'a dyn Inference, timeout: Duration) -> Self {
        Self { inference, timeout }
    }

    pub async fn key_terms(&self, query: &str) -> String {
        generate_or_none(self.inference, &key_terms_prompt(query), self.timeout, "key term extraction")
            .await
            .map(|terms| terms.trim().to_string())
            .unwrap_or_default()
    }

    pub async fn prioritize(&self, candidates: &[SourceCandidate], query: &str) -> Vec<SourceCandidate> {
        if candidates.len() <= MIN_PRIORITIZED {
            info!("Only {} candidates; keeping them as ranked", candidates.len());
            return candidates.to_vec();
        }

        let urls = SourceCandidate::urls(candidates);
        let key_terms = self.key_terms(query).await;
        info!("Extracted key terms: {}", key_terms);

        let buckets = bucketize(&urls);
        let response = generate_or_none(
            self.inference,
            &ranking_prompt(query, &key_terms, &buckets),
            self.timeout,
            "source ranking",
        )
        .await
        .unwrap_or_default();

        let mut prioritized = parse_ranking(&response, &urls);
        if prioritized.is_empty() {
            warn!("No usable ranking; taking up to {} sources per authority bucket", PER_BUCKET_FALLBACK);
            prioritized = buckets
                .into_iter()
                .flat_map(|(_, members)| members.into_iter().take(PER_BUCKET_FALLBACK))
                .collect();
        }

        if prioritized.len() > MAX_PRIORITIZED {
            prioritized.truncate(MAX_PRIORITIZED);
        } else if prioritized.len() < MIN_PRIORITIZED {
            for url in &urls {
                if prioritized.len() >= PAD_TARGET {
                    break;
                }
                if !prioritized.contains(url) {
                    prioritized.push(url.clone());
                }
            }
        }

        let prioritized = SourceCandidate::ranked(prioritized);
        info!("Prioritized {} websites", prioritized.len());
        prioritized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedInference;

    fn candidates(urls: &[&str]) -> Vec<SourceCandidate> {
        SourceCandidate::ranked(urls.iter().map(|u| u.to_string()))
    }

    const EIGHT: [&str; 8] = [
        "https://www.takemefishing.org",
        "https://www.fieldandstream.com/fishing",
        "https://www.wildlife.ca.gov",
        "https://en.wikipedia.org",
        "https://www.latimes.com",
        "https://www.bassmaster.com",
        "https://www.in-fisherman.com",
        "https://www.fishingworld.com.au",
    ];

    #[test]
    fn authority_buckets_follow_domain_patterns() {
        assert_eq!(AuthorityBucket::of("https://www.wildlife.ca.gov"), AuthorityBucket::Official);
        assert_eq!(AuthorityBucket::of("https://www.latimes.com"), AuthorityBucket::News);
        assert_eq!(AuthorityBucket::of("https://en.wikipedia.org"), AuthorityBucket::Reference);
        assert_eq!(AuthorityBucket::of("https://www.bassmaster.com"), AuthorityBucket::Other);
    }

    #[tokio::test]
    async fn three_or_fewer_candidates_pass_through() {
        let inference = ScriptedInference::new();
        let input = candidates(&EIGHT[..3]);

        let output = SourcePrioritizer::new(&inference, Duration::from_secs(1))
            .prioritize(&input, "fishing spots")
            .await;

        assert_eq!(output, input);
        assert!(inference.prompts().is_empty());
    }

    #[test]
    fn ranking_rejects_urls_outside_the_candidates() {
        let urls: Vec<String> = EIGHT.iter().map(|u| u.to_string()).collect();
        let response = "1. https://www.wildlife.ca.gov/fishing/inland.\n\
                        2. https://www.madeup-fishing-site.com\n\
                        Here is why:\n\
                        3. https://en.wikipedia.org,\n\
                        4. https://www.wildlife.ca.gov";

        assert_eq!(
            parse_ranking(response, &urls),
            vec!["https://www.wildlife.ca.gov", "https://en.wikipedia.org"]
        );
    }

    #[tokio::test]
    async fn short_rankings_are_padded_from_the_candidates() {
        let inference = ScriptedInference::new()
            .on("Extract 3-5 key terms", "fishing, California, spots")
            .on("numbered list of 5-6 websites", "1. https://www.bassmaster.com");

        let output = SourcePrioritizer::new(&inference, Duration::from_secs(1))
            .prioritize(&candidates(&EIGHT), "fishing spots")
            .await;

        let urls: Vec<&str> = output.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://www.bassmaster.com",
                "https://www.takemefishing.org",
                "https://www.fieldandstream.com/fishing",
                "https://www.wildlife.ca.gov",
                "https://en.wikipedia.org",
            ]
        );
        assert!(inference.prompts()[1].contains("The key concepts in this query are: fishing, California, spots"));
    }

    #[tokio::test]
    async fn unusable_ranking_takes_two_per_bucket() {
        let inference = ScriptedInference::new();

        let output = SourcePrioritizer::new(&inference, Duration::from_secs(1))
            .prioritize(&candidates(&EIGHT), "fishing spots")
            .await;

        let urls: Vec<&str> = output.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://www.wildlife.ca.gov",
                "https://www.latimes.com",
                "https://en.wikipedia.org",
                "https://www.takemefishing.org",
                "https://www.fieldandstream.com/fishing",
            ]
        );
    }

    #[tokio::test]
    async fn long_rankings_are_clamped_to_six() {
        let ranking: String = EIGHT
            .iter()
            .enumerate()
            .map(|(i, url)| format!("{}. {}\n", i + 1, url))
            .collect();
        let inference = ScriptedInference::new().on("numbered list of 5-6 websites", &ranking);

        let output = SourcePrioritizer::new(&inference, Duration::from_secs(1))
            .prioritize(&candidates(&EIGHT), "fishing spots")
            .await;

        assert_eq!(output.len(), 6);
        assert_eq!(output[5].rank, 6);
    }
}
