use futures::stream::{self, StreamExt};
use lazy_static::lazy_static;
use log::{error, info, warn};
use regex::Regex;
use std::time::Duration;

use crate::client::Inference;
use crate::errors::ResearchError;
use crate::research::fetcher::{FetchResult, FetchedPage, Fetcher};
use crate::research::headlines::{gather_headlines, is_headline_request};
use crate::research::persist::ensure_sources_section;
use crate::research::query::SearchQuery;
use crate::research::relevance::{acknowledges_limitations, validate, ValidationVerdict};
use crate::research::SourceCandidate;
use crate::text::truncate_chars;

const SAMPLE_EXCERPTS: usize = 3;
const PER_PATTERN: usize = 3;

lazy_static! {
    static ref EXCERPT_PATTERNS: [Regex; 3] = [
        Regex::new(r"(?m)^[ \t]*[•\-*][ \t]*([^\n\r]{10,150})").expect("valid bullet regex"),
        Regex::new(r"(?m)^[ \t]*\d+\.[ \t]*([^\n\r]{10,150})").expect("valid numbered regex"),
        Regex::new(r"(?m)^#+[ \t]*([^\n\r]{5,100})").expect("valid heading regex"),
    ];
}

/// Synthesized research output for one gathering pass.
#[derive(Debug, Clone, PartialEq)]
pub struct GatheredReport {
    /// Report text, always ending with a sources section.
    pub body: String,
    pub sample_excerpts: Vec<String>,
    /// Only URLs whose fetch succeeded with non-empty text, in priority order.
    pub sources_used: Vec<String>,
    /// `body` split on blank lines.
    pub information: Vec<String>,
    pub headlines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GatherOutcome {
    pub report: GatheredReport,
    /// Verdict on the synthesized text before any rewrite.
    pub verdict: ValidationVerdict,
}

struct SourceText {
    url: String,
    title: String,
    content: String,
}

fn synthesis_prompt(query: &str, corpus: &str) -> String {
    format!(
        "You are a research assistant tasked with gathering specific information about: {q}\n\n\
         RESEARCH OBJECTIVE: Extract, analyze, and synthesize information SPECIFICALLY about {q} from the web content below.\n\n\
         STEP 1: INFORMATION EXTRACTION\n\
         - Carefully read through ALL the provided web content\n\
         - Identify ONLY information specifically related to {q}\n\
         - Extract facts, data, opinions, and details that directly answer the query\n\
         - Pay special attention to dates, names, statistics, and specific details\n\
         - IGNORE any content not directly related to {q}\n\n\
         STEP 2: ANALYSIS & SYNTHESIS\n\
         - Organize the extracted information into logical categories\n\
         - Identify patterns, trends, or consensus across multiple sources\n\
         - Note any contradictions or differing perspectives\n\n\
         STEP 3: RESPONSE FORMULATION\n\
         Format your response with:\n\
         1. A clear main heading: \"Information about: {q}\"\n\
         2. Logical subheadings that organize the information\n\
         3. Bullet points or numbered lists for key facts and details\n\
         4. A concise conclusion summarizing the key findings\n\
         5. A \"Sources\" section listing ALL websites referenced\n\n\
         IMPORTANT GUIDELINES:\n\
         - If the EXACT information about {q} is not available, CLEARLY STATE THIS at the beginning of your response\n\
         - If no specific information about {q} is found, DO NOT provide general information about other topics\n\
         - Instead, state: \"No specific information about {q} was found in the provided sources.\"\n\
         - DO NOT summarize unrelated content from the websites\n\
         - Do NOT make up or infer information not present in the content\n\
         - ALWAYS include a \"Sources\" section with a numbered list of all websites used\n\n\
         Web Content:\n{corpus}",
        q = query,
        corpus = corpus,
    )
}

/// Report used when nothing relevant was found. Lists the sources that were checked.
pub fn no_information_report(query: &str, checked: &[String]) -> String {
    let listed = if checked.is_empty() {
        "No sources could be read.".to_string()
    } else {
        checked
            .iter()
            .enumerate()
            .map(|(i, url)| format!("{}. {}", i + 1, url))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "# Information about: {q}\n\n\
         No specific information about {q} was found in the provided sources.\n\n\
         The web search did not return relevant content specifically about {q}. This could be due to:\n\n\
         - The topic may be specialized or niche\n\
         - The selected websites may not cover this specific topic\n\
         - The information may exist but wasn't found in the current search\n\n\
         You may want to try:\n\n\
         1. Searching with more specific keywords\n\
         2. Checking specialized websites or forums related to {q}\n\
         3. Looking for academic or technical resources if this is a specialized topic\n\n\
         ## Sources\n\n\
         The following sources were checked but did not contain specific information about {q}:\n\n\
         {listed}\n",
        q = query,
        listed = listed,
    )
}

/// Up to three preview snippets: bullets, then numbered items, then headings, then mid-length sentences.
pub fn sample_excerpts(report: &str, query: &str, source_count: usize) -> Vec<String> {
    fn push(item: &str, samples: &mut Vec<String>) {
        let item = item.trim();
        if item.chars().count() > 10 && !samples.iter().any(|s| s == item) {
            samples.push(item.to_string());
        }
    }

    let mut samples: Vec<String> = Vec::new();

    for pattern in EXCERPT_PATTERNS.iter() {
        for caps in pattern.captures_iter(report).take(PER_PATTERN) {
            push(&caps[1], &mut samples);
        }
        if samples.len() >= SAMPLE_EXCERPTS {
            break;
        }
    }

    if samples.len() < SAMPLE_EXCERPTS {
        let sentences = report
            .split(|c| c == '.' || c == '\n')
            .map(str::trim)
            .filter(|sentence| !sentence.starts_with('#'));
        for sentence in sentences {
            let len = sentence.chars().count();
            if len > 15 && len < 100 {
                push(sentence, &mut samples);
            }
            if samples.len() >= SAMPLE_EXCERPTS {
                break;
            }
        }
    }

    samples.truncate(SAMPLE_EXCERPTS);
    if samples.is_empty() {
        samples.push(format!(
            "Information gathered about {} from {} websites.",
            query, source_count
        ));
    }
    samples
}

pub fn paragraphs(body: &str) -> Vec<String> {
    let paragraphs: Vec<String> = body
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    if paragraphs.is_empty() && !body.trim().is_empty() {
        vec![body.trim().to_string()]
    } else {
        paragraphs
    }
}

pub struct InformationGatherer<'a> {
    fetcher: &'a dyn Fetcher,
    inference: &'a dyn Inference,
    fetch_timeout: Duration,
    inference_timeout: Duration,
    max_source_chars: usize,
    concurrency: usize,
}

impl<'a> InformationGatherer<'a> {
    pub fn new(
        fetcher: &'a dyn Fetcher,
        inference: &'a dyn Inference,
        fetch_timeout: Duration,
        inference_timeout: Duration,
    ) -> Self {
        Self {
            fetcher,
            inference,
            fetch_timeout,
            inference_timeout,
            max_source_chars: 5_000,
            concurrency: 1,
        }
    }

    pub fn with_limits(mut self, max_source_chars: usize, concurrency: usize) -> Self {
        self.max_source_chars = max_source_chars;
        self.concurrency = concurrency.max(1);
        self
    }

    /// Fetch results in the same order as `sources`, at most `concurrency` in flight.
    async fn fetch_all(&self, sources: &[SourceCandidate]) -> Vec<FetchResult> {
        stream::iter(sources.iter())
            .map(|candidate| self.fetcher.fetch(&candidate.url, self.fetch_timeout))
            .buffered(self.concurrency)
            .collect()
            .await
    }

    pub async fn gather(
        &self,
        sources: &[SourceCandidate],
        query: &SearchQuery,
    ) -> Result<GatherOutcome, ResearchError> {
        info!(
            "Gathering information about '{}' from {} websites",
            query.text,
            sources.len()
        );

        let mut pages: Vec<FetchedPage> = Vec::new();
        let mut texts: Vec<SourceText> = Vec::new();

        for result in self.fetch_all(sources).await {
            match result {
                FetchResult::Page(page) if !page.text.trim().is_empty() => {
                    info!("Extracted {} characters from {}", page.text.len(), page.url);
                    texts.push(SourceText {
                        url: page.url.clone(),
                        title: page.title.clone(),
                        content: truncate_chars(&page.text, self.max_source_chars, ""),
                    });
                    pages.push(page);
                }
                FetchResult::Page(page) => warn!("No content extracted from {}", page.url),
                FetchResult::Failed(error) => warn!("Skipping {}: {}", error.url(), error),
            }
        }

        if texts.is_empty() {
            error!("No source yielded content for '{}'", query.text);
            return Err(ResearchError::NoSourcesSucceeded {
                query: query.text.clone(),
                attempted: sources.len(),
            });
        }

        let sources_used: Vec<String> = texts.iter().map(|t| t.url.clone()).collect();
        let corpus = texts
            .iter()
            .map(|t| format!("Source: {}\nTitle: {}\n{}", t.url, t.title, t.content))
            .collect::<Vec<_>>()
            .join("\n\n");

        let synthesized = match self
            .inference
            .generate(&synthesis_prompt(&query.text, &corpus), self.inference_timeout)
            .await
        {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                return Err(ResearchError::SynthesisFailed {
                    query: query.text.clone(),
                    message: "empty response".to_string(),
                })
            }
            Err(e) => {
                warn!("Synthesis failed: {}", e);
                return Err(ResearchError::SynthesisFailed {
                    query: query.text.clone(),
                    message: e.to_string(),
                });
            }
        };

        let verdict = validate(&synthesized, &query.text);
        info!("Relevance check: {}", verdict.reason);

        let body = if !verdict.is_relevant && !acknowledges_limitations(&synthesized) {
            warn!("Replacing off-topic synthesis with a no-information report");
            no_information_report(&query.text, &sources_used)
        } else {
            synthesized
        };

        let headlines = if is_headline_request(&query.original) {
            gather_headlines(&pages, &query.text, self.inference, self.inference_timeout)
                .await
                .headlines
        } else {
            Vec::new()
        };

        let sample_excerpts = if headlines.is_empty() {
            sample_excerpts(&body, &query.text, sources_used.len())
        } else {
            headlines.iter().take(SAMPLE_EXCERPTS).cloned().collect()
        };

        let body = ensure_sources_section(&body, &sources_used);
        let information = paragraphs(&body);

        Ok(GatherOutcome {
            report: GatheredReport {
                body,
                sample_excerpts,
                sources_used,
                information,
                headlines,
            },
            verdict,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::InferenceError;
    use crate::research::relevance::VerdictReason;
    use crate::testing::{MapFetcher, ScriptedInference};

    const QUERY: &str = "California fishing spots for trout";
    const RELEVANT_REPORT: &str = "# Information about: California fishing spots\n\n\
        - Lake Tahoe holds large lake trout year round\n\
        - The Owens River opens for trout in late April\n\
        - Hot Creek is catch-and-release only\n\n\
        In 2023 the state stocked 20% more fish.";

    fn sources(urls: &[&str]) -> Vec<SourceCandidate> {
        SourceCandidate::ranked(urls.iter().map(|u| u.to_string()))
    }

    fn gatherer<'a>(fetcher: &'a MapFetcher, inference: &'a ScriptedInference) -> InformationGatherer<'a> {
        InformationGatherer::new(fetcher, inference, Duration::from_secs(1), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn failed_sources_are_skipped_and_order_is_kept() {
        let fetcher = MapFetcher::new()
            .with_page("https://a.example", "Tahoe trout details")
            .with_page("https://c.example", "Owens River trout details");
        let inference = ScriptedInference::new().on("RESEARCH OBJECTIVE", RELEVANT_REPORT);

        let outcome = gatherer(&fetcher, &inference)
            .gather(&sources(&["https://a.example", "https://b.example", "https://c.example"]), &SearchQuery::verbatim(QUERY))
            .await
            .unwrap();

        assert_eq!(outcome.report.sources_used, vec!["https://a.example", "https://c.example"]);
        assert!(outcome.verdict.is_relevant);
        assert!(outcome.report.body.ends_with("## Sources\n\n1. https://a.example\n2. https://c.example\n"));
        assert_eq!(fetcher.fetched(), vec!["https://a.example", "https://b.example", "https://c.example"]);

        let prompt = &inference.prompts()[0];
        let a = prompt.find("Source: https://a.example\nTitle: Title of https://a.example\nTahoe trout details").unwrap();
        let c = prompt.find("Source: https://c.example").unwrap();
        assert!(a < c);
        assert!(!prompt.contains("b.example"));
    }

    #[tokio::test]
    async fn bounded_concurrency_preserves_priority_order() {
        let fetcher = MapFetcher::new()
            .with_page("https://a.example", "first")
            .with_page("https://b.example", "second")
            .with_page("https://c.example", "third");
        let inference = ScriptedInference::new().on("RESEARCH OBJECTIVE", RELEVANT_REPORT);

        let outcome = gatherer(&fetcher, &inference)
            .with_limits(5_000, 3)
            .gather(&sources(&["https://a.example", "https://b.example", "https://c.example"]), &SearchQuery::verbatim(QUERY))
            .await
            .unwrap();

        assert_eq!(
            outcome.report.sources_used,
            vec!["https://a.example", "https://b.example", "https://c.example"]
        );
    }

    #[tokio::test]
    async fn every_source_failing_is_no_sources_succeeded() {
        let fetcher = MapFetcher::new();
        let inference = ScriptedInference::new();

        let result = gatherer(&fetcher, &inference)
            .gather(&sources(&["https://a.example", "https://b.example"]), &SearchQuery::verbatim(QUERY))
            .await;

        assert_eq!(
            result,
            Err(ResearchError::NoSourcesSucceeded { query: QUERY.to_string(), attempted: 2 })
        );
        assert!(inference.prompts().is_empty());
    }

    #[tokio::test]
    async fn synthesis_failure_is_recoverable() {
        let fetcher = MapFetcher::new().with_page("https://a.example", "text");
        let inference = ScriptedInference::new().fail_on("RESEARCH OBJECTIVE", InferenceError::Timeout { seconds: 1 });

        let err = gatherer(&fetcher, &inference)
            .gather(&sources(&["https://a.example"]), &SearchQuery::verbatim(QUERY))
            .await
            .unwrap_err();

        assert!(matches!(err, ResearchError::SynthesisFailed { .. }));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn off_topic_synthesis_is_rewritten() {
        let fetcher = MapFetcher::new().with_page("https://a.example", "surf report");
        let inference = ScriptedInference::new().on("RESEARCH OBJECTIVE", "Surf conditions were great all week.");

        let outcome = gatherer(&fetcher, &inference)
            .gather(&sources(&["https://a.example"]), &SearchQuery::verbatim(QUERY))
            .await
            .unwrap();

        assert!(!outcome.verdict.is_relevant);
        assert_eq!(outcome.verdict.reason, VerdictReason::TopicMissing);
        assert!(outcome
            .report
            .body
            .contains("No specific information about California fishing spots for trout was found in the provided sources."));
        assert!(outcome.report.body.contains("1. https://a.example"));
        assert_eq!(outcome.report.body.matches("## Sources").count(), 1);
    }

    #[tokio::test]
    async fn limitation_acknowledging_synthesis_is_kept() {
        let fetcher = MapFetcher::new().with_page("https://a.example", "surf report");
        let inference = ScriptedInference::new()
            .on("RESEARCH OBJECTIVE", "Trout stocking data was not available in these sources.");

        let outcome = gatherer(&fetcher, &inference)
            .gather(&sources(&["https://a.example"]), &SearchQuery::verbatim(QUERY))
            .await
            .unwrap();

        assert_eq!(outcome.verdict.reason, VerdictReason::AcknowledgesLimitations);
        assert!(outcome.report.body.starts_with("Trout stocking data was not available"));
    }

    #[tokio::test]
    async fn headline_requests_use_headlines_as_excerpts() {
        let markup = "<html><body>\
            <h2>Nintendo announces a new handheld console</h2>\
            <h2>Indie studio tops the charts this week</h2>\
            <h2>Esports league expands to three new cities</h2>\
            <h2>Classic shooter remastered for modern hardware</h2>\
            </body></html>";
        let fetcher = MapFetcher::new().with_markup("https://news.example", "gaming news roundup", markup);
        let inference = ScriptedInference::new().on(
            "RESEARCH OBJECTIVE",
            "# Information about: latest gaming headlines\n\n- Several latest gaming headlines cover console launches\n- More gaming headlines follow",
        );

        let outcome = gatherer(&fetcher, &inference)
            .gather(&sources(&["https://news.example"]), &SearchQuery::verbatim("latest gaming headlines"))
            .await
            .unwrap();

        assert_eq!(outcome.report.headlines.len(), 4);
        assert_eq!(
            outcome.report.sample_excerpts,
            vec![
                "Nintendo announces a new handheld console",
                "Indie studio tops the charts this week",
                "Esports league expands to three new cities",
            ]
        );
        assert_eq!(inference.prompts_containing("extracting headlines"), 0);
    }

    #[test]
    fn excerpts_prefer_bullets() {
        let samples = sample_excerpts(RELEVANT_REPORT, QUERY, 2);
        assert_eq!(
            samples,
            vec![
                "Lake Tahoe holds large lake trout year round",
                "The Owens River opens for trout in late April",
                "Hot Creek is catch-and-release only",
            ]
        );
    }

    #[test]
    fn excerpts_fall_back_to_headings_and_sentences() {
        let report = "## Regulations overview\nLicenses are required for anglers over sixteen. Short one. Night fishing is allowed on most lakes";
        let samples = sample_excerpts(report, QUERY, 1);
        assert_eq!(
            samples,
            vec![
                "Regulations overview",
                "Licenses are required for anglers over sixteen",
                "Night fishing is allowed on most lakes",
            ]
        );
    }

    #[test]
    fn excerpts_default_to_a_generic_line() {
        assert_eq!(
            sample_excerpts("ok", "tide tables", 4),
            vec!["Information gathered about tide tables from 4 websites."]
        );
    }

    #[test]
    fn paragraphs_split_on_blank_lines() {
        assert_eq!(paragraphs("one\n\n\ntwo\nlines\n\n"), vec!["one", "two\nlines"]);
    }
}
