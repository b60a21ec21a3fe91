use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::text::{trim_token, KeywordSet};

const DEFAULT_EXTENSION: &str = "txt";

/// Words that can follow "save ... to/as/in" without naming a file.
const NON_NAMES: [&str; 18] = [
    "a", "an", "the", "my", "your", "our", "this", "that", "it", "file", "folder", "directory",
    "documents", "desktop", "downloads", "home", "disk", "text",
];

/// Suffixes of web hosts, never file extensions.
const WEB_SUFFIXES: [&str; 13] = [
    "com", "org", "net", "edu", "gov", "io", "co", "uk", "info", "news", "tv", "ai", "dev",
];

lazy_static! {
    static ref QUOTED: Regex =
        Regex::new(r#"(?:^|[\s(\[{:,;=])["“'‘]([^"“”'‘’\n]{1,120}?)["”'’]"#).expect("valid quoted token regex");
    static ref HAS_EXTENSION: Regex = Regex::new(r"\.[A-Za-z0-9]{1,5}$").expect("valid extension regex");
    static ref ANCHOR: Regex = Regex::new(r"(?i)\b(?:save|saved|named|called|as)\b").expect("valid anchor regex");
    static ref SAVE_VERB: Regex = Regex::new(r"(?i)\bsave\b").expect("valid save regex");
    static ref SAVE_TARGET: Regex = Regex::new(
        r#"(?i)\b(?:to|as|in)\s+(?:(?:a|the)\s+(?:new\s+)?file\s+(?:named|called)\s+)?["“'‘]?([^\s"“”'‘’]+)"#
    )
    .expect("valid save target regex");
    static ref CREATE_NAMED: Regex = Regex::new(
        r#"(?i)\b(?:create|write|make)\s+(?:a\s+|an\s+|the\s+)?(?:new\s+)?file\s+(?:named|called)\s+["“'‘]?([^\s"“”'‘’]+)"#
    )
    .expect("valid create-file regex");
    static ref DOTTED_TOKEN: Regex =
        Regex::new(r"(?:^|[\s(\[{:,;=])([A-Za-z0-9_\-]+(?:\.[A-Za-z0-9_\-]+)+)").expect("valid dotted token regex");

    /// Checked in order; the first matching noun set names the content type.
    static ref CONTENT_TYPES: Vec<(&'static str, KeywordSet)> = vec![
        ("essay", KeywordSet::new(&["essay", "essays", "paper", "article", "composition"])),
        ("story", KeywordSet::new(&["story", "stories", "tale", "narrative", "fiction"])),
        ("poem", KeywordSet::new(&["poem", "poems", "poetry", "verse", "rhyme"])),
        ("report", KeywordSet::new(&["report", "analysis", "summary", "review"])),
        ("letter", KeywordSet::new(&["letter", "email", "correspondence"])),
        ("script", KeywordSet::new(&["script", "screenplay", "dialogue"])),
        ("code", KeywordSet::new(&["code", "program", "function"])),
        ("recipe", KeywordSet::new(&["recipe", "instructions", "steps", "ingredients"])),
        ("note", KeywordSet::new(&["note", "notes", "memo", "reminder"])),
        ("document", KeywordSet::new(&["document", "doc", "file"])),
    ];
}

/// A target file name. The extension is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Filename {
    pub stem: String,
    pub extension: String,
}

impl Filename {
    pub fn new(stem: &str, extension: &str) -> Self {
        let extension = extension.trim_start_matches('.');
        Self {
            stem: stem.to_string(),
            extension: if extension.is_empty() {
                DEFAULT_EXTENSION.to_string()
            } else {
                extension.to_string()
            },
        }
    }

    /// Parse a captured token: directories and surrounding punctuation are dropped.
    pub fn parse(token: &str) -> Option<Self> {
        let token = trim_token(token);
        let name = Path::new(token).file_name()?.to_str()?;
        let name = trim_token(name);

        match name.rsplit_once('.') {
            Some((stem, extension)) if !stem.is_empty() && !extension.is_empty() => {
                Some(Self::new(stem, extension))
            }
            Some((stem, _)) if !stem.is_empty() => Some(Self::new(stem, DEFAULT_EXTENSION)),
            Some(_) => None,
            None if !name.is_empty() => Some(Self::new(name, DEFAULT_EXTENSION)),
            None => None,
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.stem, self.extension)
    }
}

impl fmt::Display for Filename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.stem, self.extension)
    }
}

fn is_non_name(token: &str) -> bool {
    NON_NAMES.contains(&token.to_lowercase().as_str())
}

/// Quoted token with an extension, preferring the one closest after a save/named/called anchor.
fn quoted_with_extension(text: &str) -> Option<Filename> {
    let anchors: Vec<usize> = ANCHOR.find_iter(text).map(|m| m.end()).collect();

    QUOTED
        .captures_iter(text)
        .filter_map(|caps| {
            let token = caps.get(1)?;
            if !HAS_EXTENSION.is_match(token.as_str().trim()) {
                return None;
            }
            let distance = anchors
                .iter()
                .filter(|end| **end <= token.start())
                .map(|end| token.start() - end)
                .min()
                .unwrap_or(usize::MAX);
            Some((distance, token.as_str()))
        })
        .min_by_key(|(distance, _)| *distance)
        .and_then(|(_, token)| Filename::parse(token))
}

fn save_target(text: &str) -> Option<Filename> {
    let save = SAVE_VERB.find(text)?;
    let clause = &text[save.end()..];

    SAVE_TARGET
        .captures_iter(clause)
        .filter_map(|caps| caps.get(1).map(|m| trim_token(m.as_str())))
        .find(|token| !token.is_empty() && !is_non_name(token))
        .and_then(Filename::parse)
}

fn create_named_file(text: &str) -> Option<Filename> {
    CREATE_NAMED
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| trim_token(m.as_str()))
        .filter(|token| !is_non_name(token))
        .and_then(Filename::parse)
}

fn any_quoted(text: &str) -> Option<Filename> {
    QUOTED
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .find(|token| !token.is_empty())
        .and_then(Filename::parse)
}

fn bare_filename(text: &str) -> Option<Filename> {
    DOTTED_TOKEN.captures_iter(text).find_map(|caps| {
        let token = caps.get(1)?.as_str();
        let segments: Vec<String> = token.split('.').map(str::to_lowercase).collect();
        let extension = segments.last()?;

        let is_web = segments.first().map(|s| s == "www").unwrap_or(false)
            || segments.iter().skip(1).any(|s| WEB_SUFFIXES.contains(&s.as_str()));
        let plausible = (2..=4).contains(&extension.len())
            && extension.chars().all(|c| c.is_ascii_alphanumeric())
            && extension.chars().any(|c| c.is_ascii_alphabetic());

        if is_web || !plausible {
            None
        } else {
            Filename::parse(token)
        }
    })
}

type FilenameRule = (&'static str, fn(&str) -> Option<Filename>);

/// Rules tied to a save/name anchor or a quoted name with an extension.
const ANCHORED_RULES: [FilenameRule; 3] = [
    ("quoted_with_extension", quoted_with_extension),
    ("save_target", save_target),
    ("create_named_file", create_named_file),
];

/// Most specific first; the first rule that yields a name wins.
const FILENAME_RULES: [FilenameRule; 5] = [
    ("quoted_with_extension", quoted_with_extension),
    ("save_target", save_target),
    ("create_named_file", create_named_file),
    ("any_quoted", any_quoted),
    ("bare_filename", bare_filename),
];

/// Content noun found in the text, defaulting to `document`.
pub fn content_type(text: &str) -> &'static str {
    CONTENT_TYPES
        .iter()
        .find(|(_, nouns)| nouns.matches(text))
        .map(|(kind, _)| *kind)
        .unwrap_or("document")
}

fn first_match(rules: &[FilenameRule], text: &str) -> Option<Filename> {
    rules.iter().find_map(|(name, rule)| {
        let found = rule(text)?;
        debug!("Filename '{}' from rule {}", found, name);
        Some(found)
    })
}

/// A file name the text names explicitly, if any.
pub fn find_explicit(text: &str) -> Option<Filename> {
    first_match(&FILENAME_RULES, text)
}

/// Only names given as an output target. Quoted topics and dotted words ("Node.js") are not names here.
pub fn find_anchored(text: &str) -> Option<Filename> {
    first_match(&ANCHORED_RULES, text)
}

/// Explicit file name, or `{content type}.txt`.
pub fn extract(text: &str) -> Filename {
    find_explicit(text).unwrap_or_else(|| Filename::new(content_type(text), DEFAULT_EXTENSION))
}
