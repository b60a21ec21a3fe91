use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde::Serialize;
use std::fmt;

use crate::text::KeywordSet;

lazy_static! {
    static ref URL: Regex = Regex::new(r"(?i)\b(?:https?://|www\.)\S+").expect("valid url regex");
    static ref DOMAIN_TOKEN: Regex = Regex::new(
        r"(?i)\b(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+(?:com|org|net|edu|gov|io|co|uk|info|news|tv|ai|dev)\b"
    )
    .expect("valid domain regex");
    /// A construction verb governing a content noun: "write a short story", "create a new file".
    static ref CONSTRUCTION: Regex = Regex::new(
        r"(?i)\b(?:create|write|compose|draft|generate|make)\s+(?:(?:a|an|the|me|my|some|new|short|long|brief|simple|quick|little)\s+){0,3}(?:file|document|story|poem|essay|article|report|note|notes|letter|text|script|recipe|haiku|list)s?\b"
    )
    .expect("valid construction regex");
    static ref IMAGE_EXTENSION: Regex =
        Regex::new(r"(?i)\.(?:png|jpe?g|gif|bmp|webp|tiff?|heic)\b").expect("valid image extension regex");

    static ref ANALYSIS_VERBS: KeywordSet =
        KeywordSet::new(&["analyze", "analyse", "describe", "examine", "inspect", "caption", "identify", "what's in"]);
    static ref IMAGE_NOUNS: KeywordSet = KeywordSet::new(&[
        "image", "images", "picture", "pictures", "photo", "photos", "photograph", "photographs", "screenshot", "wallpaper", "wallpapers",
    ]);
    static ref DISCOVERY_VERBS: KeywordSet = KeywordSet::new(&[
        "find", "search", "look for", "look up", "gather", "collect", "compile", "research", "get", "fetch", "download", "browse",
    ]);
    static ref PERSISTENCE_VERBS: KeywordSet =
        KeywordSet::new(&["save", "store", "keep", "download", "export", "put"]);
    static ref ORGANIZATION_VERBS: KeywordSet = KeywordSet::new(&[
        "organize", "organise", "sort", "categorize", "categorise", "group", "arrange", "tidy", "clean up",
    ]);
    static ref DELETION_VERBS: KeywordSet =
        KeywordSet::new(&["delete", "remove", "erase", "trash", "wipe"]);
    static ref FILE_NOUNS: KeywordSet =
        KeywordSet::new(&["file", "files", "document", "documents", "downloads"]);
    static ref FOLDER_NOUNS: KeywordSet =
        KeywordSet::new(&["folder", "folders", "directory", "directories"]);
    static ref INFO_NOUNS: KeywordSet = KeywordSet::new(&[
        "information", "info", "data", "details", "facts", "news", "headlines", "website", "websites", "about",
    ]);
    static ref GENERAL_VERBS: KeywordSet = KeywordSet::new(&[
        "create", "write", "compose", "draft", "generate", "make", "save", "store",
    ]);
}

/// Execution path a task is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    FileCreation,
    ImageAnalysis,
    ImageSearch,
    FileOrganization,
    FileDeletion,
    WebResearch,
    General,
}

impl TaskKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::FileCreation => "file_creation",
            TaskKind::ImageAnalysis => "image_analysis",
            TaskKind::ImageSearch => "image_search",
            TaskKind::FileOrganization => "file_organization",
            TaskKind::FileDeletion => "file_deletion",
            TaskKind::WebResearch => "web_research",
            TaskKind::General => "general",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evidence the cascade looked at. Computed once per request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskSignals {
    pub url: Option<String>,
    pub domain: Option<String>,
    pub constructs_content: bool,
    pub analysis_verb: bool,
    pub image_reference: bool,
    pub discovery_verb: bool,
    pub persistence_verb: bool,
    pub organization_verb: bool,
    pub deletion_verb: bool,
    pub file_noun: bool,
    pub folder_noun: bool,
    pub info_noun: bool,
    pub general_verb: bool,
}

impl TaskSignals {
    pub fn detect(text: &str) -> Self {
        Self {
            url: URL.find(text).map(|m| m.as_str().to_string()),
            domain: DOMAIN_TOKEN.find(text).map(|m| m.as_str().to_lowercase()),
            constructs_content: CONSTRUCTION.is_match(text),
            analysis_verb: ANALYSIS_VERBS.matches(text),
            image_reference: IMAGE_NOUNS.matches(text) || IMAGE_EXTENSION.is_match(text),
            discovery_verb: DISCOVERY_VERBS.matches(text),
            persistence_verb: PERSISTENCE_VERBS.matches(text),
            organization_verb: ORGANIZATION_VERBS.matches(text),
            deletion_verb: DELETION_VERBS.matches(text),
            file_noun: FILE_NOUNS.matches(text),
            folder_noun: FOLDER_NOUNS.matches(text),
            info_noun: INFO_NOUNS.matches(text),
            general_verb: GENERAL_VERBS.matches(text),
        }
    }

    /// A URL or bare domain name. Either one routes toward research.
    pub fn references_web(&self) -> bool {
        self.url.is_some() || self.domain.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    pub kind: TaskKind,
    /// Name of the rule that matched.
    pub rule: &'static str,
    pub signals: TaskSignals,
}

type ClassificationRule = (&'static str, TaskKind, fn(&TaskSignals) -> bool);

/// Evaluated in order; the first predicate that holds decides the kind.
const RULES: [ClassificationRule; 9] = [
    ("construct_content", TaskKind::FileCreation, |s| {
        s.constructs_content && !s.references_web()
    }),
    ("analyze_image", TaskKind::ImageAnalysis, |s| {
        s.analysis_verb && s.image_reference
    }),
    ("find_and_save_images", TaskKind::ImageSearch, |s| {
        s.discovery_verb && s.image_reference && s.persistence_verb
    }),
    ("organize_files", TaskKind::FileOrganization, |s| {
        (s.organization_verb && (s.file_noun || s.folder_noun || s.image_reference))
            || (s.discovery_verb && s.file_noun && s.folder_noun)
    }),
    ("delete_files", TaskKind::FileDeletion, |s| {
        s.deletion_verb && (s.file_noun || s.image_reference)
    }),
    // No persistence verb: a lookup rather than a download.
    ("find_images", TaskKind::WebResearch, |s| {
        s.discovery_verb && s.image_reference
    }),
    ("web_reference", TaskKind::WebResearch, |s| s.references_web()),
    ("gather_information", TaskKind::WebResearch, |s| {
        s.discovery_verb && s.info_noun
    }),
    ("direct_request", TaskKind::General, |s| s.general_verb),
];

pub fn classify(text: &str) -> ClassificationResult {
    let signals = TaskSignals::detect(text);

    let (rule, kind) = RULES
        .iter()
        .find(|(_, _, applies)| applies(&signals))
        .map(|(name, kind, _)| (*name, *kind))
        .unwrap_or(("default", TaskKind::General));

    debug!("Classified as {} by rule {}", kind, rule);
    ClassificationResult {
        kind,
        rule,
        signals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(text: &str) -> TaskKind {
        classify(text).kind
    }

    #[test]
    fn story_saved_to_named_file_is_file_creation() {
        let result = classify(r#"Write a short story about a boy and save it to my Documents folder as "Ham.txt""#);
        assert_eq!(result.kind, TaskKind::FileCreation);
        assert_eq!(result.rule, "construct_content");
    }

    #[test]
    fn information_requests_are_web_research() {
        let result = classify("Find information about the best fishing spots in California");
        assert_eq!(result.kind, TaskKind::WebResearch);
        assert_eq!(result.rule, "gather_information");
    }

    #[test]
    fn urls_never_route_to_file_creation() {
        let samples = [
            "Write a report about https://example.com/article and save it as report.txt",
            "create a document summarizing www.python.org",
            "Make a note of http://localhost:8080/status",
        ];
        for text in samples {
            let result = classify(text);
            assert_ne!(result.kind, TaskKind::FileCreation, "{}", text);
            assert_eq!(result.kind, TaskKind::WebResearch, "{}", text);
        }
    }

    #[test]
    fn bare_domain_wins_over_output_file_verbs() {
        let result = classify("Write a summary file of the headlines on bbc.co.uk and save it as news.txt");
        assert_eq!(result.kind, TaskKind::WebResearch);
        assert_eq!(result.signals.domain.as_deref(), Some("bbc.co.uk"));
    }

    #[test]
    fn file_extensions_are_not_domains() {
        let signals = TaskSignals::detect("save it as notes.txt or report.md");
        assert!(!signals.references_web());
    }

    #[test]
    fn image_rules_follow_cascade_order() {
        assert_eq!(kind("Analyze this image at ~/Pictures/cat.jpg"), TaskKind::ImageAnalysis);
        assert_eq!(kind("Describe holiday.png"), TaskKind::ImageAnalysis);
        assert_eq!(kind("Find images of red pandas and save them to my desktop"), TaskKind::ImageSearch);
    }

    #[test]
    fn finding_images_without_saving_is_research() {
        for text in [
            "Find images of red pandas",
            "Search for pictures of the Eiffel Tower",
            "find photos of sunsets",
        ] {
            let result = classify(text);
            assert_eq!(result.kind, TaskKind::WebResearch, "{}", text);
            assert_eq!(result.rule, "find_images", "{}", text);
        }
    }

    #[test]
    fn file_management_rules() {
        assert_eq!(kind("Organize my downloads folder by file type"), TaskKind::FileOrganization);
        assert_eq!(kind("find the files in my projects folder"), TaskKind::FileOrganization);
        assert_eq!(kind("Delete the old files in /tmp/build"), TaskKind::FileDeletion);
        assert_eq!(kind("remove duplicate photos"), TaskKind::FileDeletion);
    }

    #[test]
    fn leftovers_are_general() {
        let direct = classify("Save a reminder for tomorrow");
        assert_eq!(direct.kind, TaskKind::General);
        assert_eq!(direct.rule, "direct_request");

        let fallback = classify("Tell me a joke");
        assert_eq!(fallback.kind, TaskKind::General);
        assert_eq!(fallback.rule, "default");
    }

    #[test]
    fn kinds_render_as_snake_case() {
        assert_eq!(TaskKind::WebResearch.to_string(), "web_research");
        assert_eq!(serde_json::to_string(&TaskKind::FileCreation).unwrap(), "\"file_creation\"");
    }
}
