use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use std::fmt;

use crate::text::dedup_preserving_order;

const LIMITATION_PHRASES: [&str; 4] = [
    "not available",
    "could not find",
    "no information",
    "no specific information",
];

/// Phrases showing a report already admits it has nothing to offer.
const ACKNOWLEDGMENT_PHRASES: [&str; 6] = [
    "limitation",
    "not available",
    "could not find",
    "no information",
    "no specific information",
    "was not found",
];

lazy_static! {
    static ref BULLETS: Regex = Regex::new(r"[•*\-]\s*[^\n\r]{10,}").expect("valid bullet regex");
    static ref NUMBERED: Regex = Regex::new(r"\d+\.\s*[^\n\r]{10,}").expect("valid numbered regex");
    static ref FACTS: Regex = Regex::new(r"(?:in\s+\d{4}|\d{4}\s*-\s*\d{4}|\$\d+|\d+%)").expect("valid fact regex");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictReason {
    Unrelated,
    AcknowledgesLimitations,
    TopicMissing,
    TooFewTerms,
    NoStructure,
    Relevant,
}

impl fmt::Display for VerdictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            VerdictReason::Unrelated => "Content appears to be unrelated to the query topic",
            VerdictReason::AcknowledgesLimitations => "Content indicates information limitations",
            VerdictReason::TopicMissing => "Content does not mention the main topic of the query",
            VerdictReason::TooFewTerms => "Content may not be specifically about the query topic",
            VerdictReason::NoStructure => "Content lacks specific facts or structured information",
            VerdictReason::Relevant => "Content contains specific information related to the query",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationVerdict {
    pub is_relevant: bool,
    pub reason: VerdictReason,
}

impl ValidationVerdict {
    fn rejected(reason: VerdictReason) -> Self {
        Self {
            is_relevant: false,
            reason,
        }
    }
}

/// First three query words, lower-cased.
pub fn main_topic(query: &str) -> String {
    query
        .split_whitespace()
        .take(3)
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn acknowledges_limitations(report: &str) -> bool {
    let lower = report.to_lowercase();
    ACKNOWLEDGMENT_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

/// Checks run in a fixed order and the first failure is the reason.
pub fn validate(report: &str, query: &str) -> ValidationVerdict {
    let lower = report.to_lowercase();
    let topic = main_topic(query);
    let topic_present = !topic.is_empty() && lower.contains(&topic);

    let terms = dedup_preserving_order(query.to_lowercase().split_whitespace().map(str::to_string));
    let term_matches = terms
        .iter()
        .filter(|term| term.chars().count() > 3 && lower.contains(term.as_str()))
        .count();

    let structured = BULLETS.is_match(report) || NUMBERED.is_match(report) || FACTS.is_match(report);
    let limited = LIMITATION_PHRASES.iter().any(|phrase| lower.contains(phrase));
    let unrelated = lower.contains("this appears to be") && !topic_present;

    debug!(
        "Relevance signals: topic_present={} term_matches={} structured={} limited={}",
        topic_present, term_matches, structured, limited
    );

    if unrelated {
        ValidationVerdict::rejected(VerdictReason::Unrelated)
    } else if limited {
        ValidationVerdict::rejected(VerdictReason::AcknowledgesLimitations)
    } else if !topic_present {
        ValidationVerdict::rejected(VerdictReason::TopicMissing)
    } else if term_matches < 2 {
        ValidationVerdict::rejected(VerdictReason::TooFewTerms)
    } else if !structured {
        ValidationVerdict::rejected(VerdictReason::NoStructure)
    } else {
        ValidationVerdict {
            is_relevant: true,
            reason: VerdictReason::Relevant,
        }
    }
}
