use regex::Regex;
use std::collections::HashSet;

/// Whole-word keyword matcher compiled into a single case-insensitive regex.
///
/// Multi-word entries ("look up", "video game") match across any run of whitespace.
#[derive(Debug, Clone)]
pub struct KeywordSet {
    pattern: Regex,
}

impl KeywordSet {
    pub fn new(words: &[&'static str]) -> Self {
        let alternatives = words
            .iter()
            .map(|word| {
                word.split_whitespace()
                    .map(regex::escape)
                    .collect::<Vec<_>>()
                    .join(r"\s+")
            })
            .collect::<Vec<_>>()
            .join("|");

        // Built from escaped literals, so the pattern is always valid.
        let pattern = Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives))
            .expect("keyword alternation is a valid regex");

        Self { pattern }
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    /// First keyword found in the text, in text order.
    pub fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.pattern.find(text).map(|m| m.as_str())
    }
}

/// Collapse every run of whitespace to a single space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate on a char boundary, appending `marker` when anything was cut.
pub fn truncate_chars(text: &str, max_chars: usize, marker: &str) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}{}", &text[..byte_index], marker),
        None => text.to_string(),
    }
}

/// Replace anything outside `[A-Za-z0-9_.-]` with `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Strip surrounding quotes and trailing sentence punctuation from a captured token.
pub fn trim_token(token: &str) -> &str {
    token
        .trim()
        .trim_start_matches(|c: char| matches!(c, '"' | '\'' | '`' | '(' | '[' | '<'))
        .trim_end_matches(|c: char| {
            matches!(c, '"' | '\'' | '`' | '.' | ',' | ';' | ':' | '!' | '?' | ')' | ']' | '>')
        })
}

pub fn dedup_preserving_order<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_set_matches_whole_words_only() {
        let royalty = KeywordSet::new(&["king", "queen"]);
        assert!(royalty.matches("The King of Norway"));
        assert!(!royalty.matches("I am looking for hiking trails"));
    }

    #[test]
    fn keyword_set_matches_phrases_across_whitespace() {
        let set = KeywordSet::new(&["look up", "video game"]);
        assert!(set.matches("please LOOK   up the weather"));
        assert_eq!(set.find("new video game releases"), Some("video game"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 4, "..."), "héll...");
        assert_eq!(truncate_chars("short", 10, "..."), "short");
    }

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize_filename("my notes/2026?.txt"), "my_notes_2026_.txt");
    }

    #[test]
    fn trim_token_strips_quotes_and_punctuation() {
        assert_eq!(trim_token("\"Ham.txt\"."), "Ham.txt");
        assert_eq!(trim_token("notes.txt:"), "notes.txt");
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let items = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        assert_eq!(dedup_preserving_order(items), vec!["a", "b"]);
    }
}
