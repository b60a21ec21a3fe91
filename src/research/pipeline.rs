use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;

use crate::client::Inference;
use crate::config::AssistantConfig;
use crate::errors::ResearchError;
use crate::research::category::{CategoryResolution, CategoryResolver};
use crate::research::fallback::FallbackCoordinator;
use crate::research::fetcher::Fetcher;
use crate::research::gatherer::{no_information_report, paragraphs, GatherOutcome, InformationGatherer};
use crate::research::persist::ResultPersister;
use crate::research::prioritizer::SourcePrioritizer;
use crate::research::query::{QueryOptimizer, SearchQuery};
use crate::research::relevance::ValidationVerdict;
use crate::research::selector::WebsiteSelector;
use crate::research::sources::SourceTables;
use crate::research::SourceCandidate;
use crate::tasks::filename::Filename;
use crate::text::dedup_preserving_order;
use crate::writers::FileWriter;

/// Everything one research run produced, including failures.
#[derive(Debug, Clone)]
pub struct ResearchReport {
    pub success: bool,
    pub resolution: CategoryResolution,
    pub query: SearchQuery,
    /// Final text as written to disk.
    pub report: String,
    pub information: Vec<String>,
    pub sample_excerpts: Vec<String>,
    pub headlines: Vec<String>,
    pub sources_used: Vec<String>,
    pub path: Option<PathBuf>,
    pub verdict: Option<ValidationVerdict>,
    /// Why the fallback pass ran, if it did.
    pub fallback_reason: Option<ResearchError>,
    pub failure: Option<ResearchError>,
}

impl ResearchReport {
    pub fn fallback_attempted(&self) -> bool {
        self.fallback_reason.is_some()
    }

    pub fn filename(&self) -> Option<String> {
        self.path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|name| name.to_string_lossy().into_owned())
    }

    pub fn error_message(&self) -> Option<String> {
        self.failure.as_ref().map(ResearchError::to_user_message)
    }
}

/// The gathering result to fall back from, if any.
fn fallback_trigger(result: &Result<GatherOutcome, ResearchError>) -> Option<ResearchError> {
    match result {
        Err(e) if e.is_recoverable() => Some(e.clone()),
        Err(_) => None,
        Ok(outcome) if !outcome.verdict.is_relevant => Some(ResearchError::NotRelevant {
            reason: outcome.verdict.reason.to_string(),
        }),
        Ok(_) => None,
    }
}

/// Resolve, optimize, select, prioritize, gather, validate, fall back once, persist.
pub struct ResearchPipeline {
    inference: Arc<dyn Inference>,
    fetcher: Arc<dyn Fetcher>,
    writer: Arc<dyn FileWriter>,
    tables: Arc<SourceTables>,
    config: AssistantConfig,
}

impl ResearchPipeline {
    pub fn new(
        inference: Arc<dyn Inference>,
        fetcher: Arc<dyn Fetcher>,
        writer: Arc<dyn FileWriter>,
        tables: Arc<SourceTables>,
        config: AssistantConfig,
    ) -> Self {
        Self {
            inference,
            fetcher,
            writer,
            tables,
            config,
        }
    }

    pub async fn run_research(&self, text: &str, suggested: Option<&Filename>) -> ResearchReport {
        let inference = self.inference.as_ref();
        let inference_timeout = self.config.inference_timeout();

        let resolution = CategoryResolver::new(inference, inference_timeout).resolve(text).await;
        info!("Researching '{}' as {}", resolution.topic, resolution.display_name());

        let query = QueryOptimizer::new(inference, inference_timeout)
            .optimize(text, &resolution)
            .await;

        let selection = WebsiteSelector::new(inference, Arc::clone(&self.tables), inference_timeout)
            .select(&query, &resolution, self.config.initial_max_sites)
            .await;
        let sources = SourcePrioritizer::new(inference, inference_timeout)
            .prioritize(&selection.candidates, &query.text)
            .await;

        let gatherer = InformationGatherer::new(
            self.fetcher.as_ref(),
            inference,
            self.config.fetch_timeout(),
            inference_timeout,
        )
        .with_limits(self.config.max_source_chars, self.config.fetch_concurrency);

        let initial = gatherer.gather(&sources, &query).await;
        let fallback_reason = fallback_trigger(&initial);

        let mut checked = SourceCandidate::urls(&sources);
        let final_result = match &fallback_reason {
            None => initial,
            Some(reason) => {
                info!("Running fallback pass: {}", reason);
                let attempt = FallbackCoordinator::new(inference, Arc::clone(&self.tables), inference_timeout)
                    .run(&gatherer, &query, resolution.category)
                    .await;
                checked.extend(SourceCandidate::urls(&attempt.sources));

                let usable = attempt.usable().is_some();
                match (usable, initial) {
                    (true, _) => attempt.result,
                    // The original keeps its limitation-acknowledging report.
                    (false, Ok(original)) => Ok(original),
                    (false, Err(_)) => attempt.result,
                }
            }
        };

        let persister = ResultPersister::new(self.writer.as_ref(), &self.config.output_dir);
        match final_result {
            Ok(outcome) => {
                let report = outcome.report;
                let persisted = persister
                    .persist(&report.body, &report.sources_used, suggested, &query.text, &resolution)
                    .await;

                let (path, failure) = match persisted {
                    Ok(artifact) => (Some(artifact.path), None),
                    Err(e) => {
                        error!("{}", e);
                        (None, Some(e))
                    }
                };

                ResearchReport {
                    success: failure.is_none(),
                    resolution,
                    query,
                    report: report.body,
                    information: report.information,
                    sample_excerpts: report.sample_excerpts,
                    headlines: report.headlines,
                    sources_used: report.sources_used,
                    path,
                    verdict: Some(outcome.verdict),
                    fallback_reason,
                    failure,
                }
            }
            Err(gather_error) => {
                warn!("No usable information for '{}': {}", query.text, gather_error);
                let checked = dedup_preserving_order(checked);
                let body = no_information_report(&query.text, &checked);

                let (path, failure) = match persister.persist(&body, &[], suggested, &query.text, &resolution).await {
                    Ok(artifact) => (Some(artifact.path), gather_error),
                    Err(e) => {
                        error!("{}", e);
                        (None, e)
                    }
                };

                ResearchReport {
                    success: false,
                    resolution,
                    query,
                    information: paragraphs(&body),
                    report: body,
                    sample_excerpts: Vec::new(),
                    headlines: Vec::new(),
                    sources_used: Vec::new(),
                    path,
                    verdict: None,
                    fallback_reason,
                    failure: Some(failure),
                }
            }
        }
    }
}
