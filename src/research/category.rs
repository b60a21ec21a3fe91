use lazy_static::lazy_static;
use log::{debug, info};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::client::{generate_or_none, Inference};
use crate::text::{collapse_whitespace, KeywordSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    News,
    Gaming,
    Tech,
    Sports,
    Health,
    Finance,
    Fishing,
    Outdoor,
    Gardening,
    Cooking,
    Royalty,
    Biographies,
    Entertainment,
    Travel,
    General,
}

impl Category {
    pub const ALL: [Category; 15] = [
        Category::News,
        Category::Gaming,
        Category::Tech,
        Category::Sports,
        Category::Health,
        Category::Finance,
        Category::Fishing,
        Category::Outdoor,
        Category::Gardening,
        Category::Cooking,
        Category::Royalty,
        Category::Biographies,
        Category::Entertainment,
        Category::Travel,
        Category::General,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::News => "news",
            Category::Gaming => "gaming",
            Category::Tech => "tech",
            Category::Sports => "sports",
            Category::Health => "health",
            Category::Finance => "finance",
            Category::Fishing => "fishing",
            Category::Outdoor => "outdoor",
            Category::Gardening => "gardening",
            Category::Cooking => "cooking",
            Category::Royalty => "royalty",
            Category::Biographies => "biographies",
            Category::Entertainment => "entertainment",
            Category::Travel => "travel",
            Category::General => "general",
        }
    }

    /// Exact label or a common alias. Unknown labels are `None`, not `General`.
    pub fn parse_label(label: &str) -> Option<Category> {
        let label = label.trim().to_lowercase();
        if let Some(category) = Category::ALL.iter().find(|c| c.label() == label) {
            return Some(*category);
        }
        let category = match label.as_str() {
            "technology" | "gadgets" | "software" => Category::Tech,
            "games" | "video games" | "video gaming" => Category::Gaming,
            "sport" => Category::Sports,
            "fitness" | "medical" | "nutrition" => Category::Health,
            "money" | "investing" | "economy" | "business" => Category::Finance,
            "fish" | "angling" => Category::Fishing,
            "outdoors" | "hiking" | "camping" => Category::Outdoor,
            "garden" | "plants" => Category::Gardening,
            "food" | "recipes" | "recipe" => Category::Cooking,
            "royal" | "royals" | "monarchy" => Category::Royalty,
            "biography" | "people" => Category::Biographies,
            "movies" | "film" | "celebrity" | "celebrities" => Category::Entertainment,
            "current events" | "headlines" => Category::News,
            "tourism" | "vacation" => Category::Travel,
            _ => return None,
        };
        Some(category)
    }

    /// Categories a free-form label plausibly refers to, best match first.
    ///
    /// Direct parse, then label/key substring overlap, then word-family hints
    /// ("angling tips" -> fishing, outdoor).
    pub fn similar_to(label: &str) -> Vec<Category> {
        let label = label.trim().to_lowercase();
        if label.is_empty() {
            return Vec::new();
        }

        let mut similar = Vec::new();
        if let Some(category) = Category::parse_label(&label) {
            similar.push(category);
        }

        for category in Category::ALL {
            if category == Category::General {
                continue;
            }
            let key = category.label();
            if (label.contains(key) || key.contains(label.as_str())) && !similar.contains(&category) {
                similar.push(category);
            }
        }

        for (hints, categories) in LABEL_FAMILIES.iter() {
            if hints.iter().any(|hint| label.contains(hint)) {
                for category in categories.iter() {
                    if !similar.contains(category) {
                        similar.push(*category);
                    }
                }
            }
        }

        similar
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const LABEL_FAMILIES: [(&[&str], &[Category]); 6] = [
    (&["fish", "angl", "rod", "bait", "tackle"], &[Category::Fishing, Category::Outdoor]),
    (&["hike", "camp", "trek", "nature", "wilderness"], &[Category::Outdoor]),
    (&["health", "fitness", "exercise", "diet", "nutrition"], &[Category::Health]),
    (&["money", "invest", "stock", "market", "economy"], &[Category::Finance]),
    (
        &["queen", "king", "royal", "monarch", "prince", "princess"],
        &[Category::Royalty, Category::Biographies],
    ),
    (&["garden", "plant", "flower", "vegetable", "soil"], &[Category::Gardening]),
];

lazy_static! {
    /// Checked in order; the first matching set decides.
    static ref CATEGORY_KEYWORDS: Vec<(Category, KeywordSet)> = vec![
        (Category::Royalty, KeywordSet::new(&["queen", "king", "royal", "royals", "monarch", "monarchy", "prince", "princess", "crown"])),
        (Category::Fishing, KeywordSet::new(&["fishing", "fish", "angler", "anglers", "angling", "rod", "rods", "bait", "tackle", "lure", "lures"])),
        (Category::Gardening, KeywordSet::new(&["garden", "gardening", "plant", "plants", "flower", "flowers", "vegetable", "vegetables", "soil", "seed", "seeds"])),
        (Category::Outdoor, KeywordSet::new(&["outdoor", "outdoors", "hiking", "camping", "backpacking", "wilderness"])),
        (Category::News, KeywordSet::new(&["news", "headline", "headlines", "current events", "breaking"])),
        (Category::Gaming, KeywordSet::new(&["gaming", "games", "game", "gamer", "gamers", "video game", "video games", "playstation", "xbox", "nintendo", "steam"])),
        (Category::Cooking, KeywordSet::new(&["cooking", "cook", "recipe", "recipes", "baking", "cuisine"])),
        (Category::Tech, KeywordSet::new(&["tech", "technology", "gadget", "gadgets", "apple", "google", "microsoft"])),
        (Category::Sports, KeywordSet::new(&["sports", "sport", "football", "soccer", "basketball", "baseball", "tennis", "nfl", "nba"])),
        (Category::Health, KeywordSet::new(&["health", "medical", "medicine", "fitness", "nutrition", "diet", "disease"])),
        (Category::Finance, KeywordSet::new(&["finance", "stock", "stocks", "invest", "investing", "economy", "market", "markets"])),
        (Category::Travel, KeywordSet::new(&["travel", "vacation", "destination", "tourism", "hotel", "flight"])),
        (Category::Entertainment, KeywordSet::new(&["movie", "movies", "film", "films", "actor", "actress", "celebrity", "tv"])),
    ];
    static ref ROYAL_FIGURE: Regex = Regex::new(r"(?i)\b(queen|king|prince|princess)\s+(?:of\s+)?(\w+)").expect("valid royal figure regex");
    static ref TOPIC_LINE: Regex = Regex::new(r"Topic:\s*(.+?)(?:\n|$)").expect("valid topic regex");
    static ref CATEGORY_LINE: Regex = Regex::new(r"Category:\s*(.+?)(?:\n|$)").expect("valid category regex");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    Keywords,
    Inference,
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryResolution {
    pub category: Category,
    /// Label as detected; may name something outside the taxonomy ("education").
    pub label: String,
    pub topic: String,
    pub source: ResolutionSource,
}

impl CategoryResolution {
    fn new(category: Category, topic: String, source: ResolutionSource) -> Self {
        Self {
            category,
            label: category.label().to_string(),
            topic,
            source,
        }
    }

    /// "Fishing", "Education", ...
    pub fn display_name(&self) -> String {
        let mut chars = self.label.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => "General".to_string(),
        }
    }

    /// Stem used for research filenames when the user named none.
    pub fn filename_stem(&self) -> String {
        match self.category {
            Category::Fishing => "fishing_guide".to_string(),
            Category::Outdoor => "outdoor_guide".to_string(),
            Category::Tech => "tech_guide".to_string(),
            Category::Gaming => "gaming_guide".to_string(),
            _ => format!("{}_info", self.label.replace(' ', "_")),
        }
    }
}

pub fn keyword_category(text: &str) -> Option<Category> {
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.matches(text))
        .map(|(category, _)| *category)
}

fn category_prompt(text: &str) -> String {
    let options = Category::ALL
        .iter()
        .filter(|c| **c != Category::General)
        .map(|c| format!("- {}", c.label()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an AI assistant tasked with analyzing a user's information request.\n\n\
         User request: {}\n\n\
         Please analyze this request and extract the following information:\n\
         1. The main topic or subject - be as specific as possible\n\
         2. The content category that best describes this topic\n\n\
         For the category, consider these options but don't limit yourself to them:\n{}\n\n\
         Respond in this exact format:\nTopic: [the specific topic]\nCategory: [specific category]",
        text, options
    )
}

fn clean_field(raw: &str) -> String {
    collapse_whitespace(raw.trim().trim_matches(|c| c == '[' || c == ']'))
}

pub struct CategoryResolver<'a> {
    inference: &'a dyn Inference,
    timeout: Duration,
}

impl<'a> CategoryResolver<'a> {
    pub fn new(inference: &'a dyn Inference, timeout: Duration) -> Self {
        Self { inference, timeout }
    }

    /// Keywords first; inference only when no keyword set matches. Never leaves the category unset.
    pub async fn resolve(&self, text: &str) -> CategoryResolution {
        if let Some(category) = keyword_category(text) {
            let topic = match category {
                Category::Royalty => ROYAL_FIGURE
                    .captures(text)
                    .map(|caps| format!("{} of {}", caps[1].to_lowercase(), caps[2].to_lowercase()))
                    .unwrap_or_else(|| "royal family".to_string()),
                _ => text.trim().to_string(),
            };
            info!("Detected {} category from keywords", category);
            return CategoryResolution::new(category, topic, ResolutionSource::Keywords);
        }

        let Some(response) =
            generate_or_none(self.inference, &category_prompt(text), self.timeout, "category resolution").await
        else {
            return CategoryResolution::new(Category::General, text.trim().to_string(), ResolutionSource::Default);
        };

        let topic = TOPIC_LINE
            .captures(&response)
            .map(|caps| clean_field(&caps[1]).to_lowercase())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| text.trim().to_lowercase());

        let Some(label) = CATEGORY_LINE
            .captures(&response)
            .map(|caps| clean_field(&caps[1]).to_lowercase())
            .filter(|l| !l.is_empty())
        else {
            debug!("No Category line in response; defaulting to general");
            return CategoryResolution::new(Category::General, topic, ResolutionSource::Default);
        };

        let category = Category::parse_label(&label).unwrap_or(Category::General);
        info!("Inference categorized request as '{}' ({})", label, category);
        CategoryResolution {
            category,
            label,
            topic,
            source: ResolutionSource::Inference,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::InferenceError;
    use crate::testing::ScriptedInference;

    fn timeout() -> Duration {
        Duration::from_secs(1)
    }

    #[tokio::test]
    async fn fishing_keywords_resolve_without_inference() {
        let inference = ScriptedInference::new();
        let resolver = CategoryResolver::new(&inference, timeout());

        let resolution = resolver
            .resolve("Find information about the best fishing spots in California")
            .await;

        assert_eq!(resolution.category, Category::Fishing);
        assert_eq!(resolution.source, ResolutionSource::Keywords);
        assert!(inference.prompts().is_empty());
    }

    #[tokio::test]
    async fn royalty_topic_names_the_figure() {
        let inference = ScriptedInference::new();
        let resolver = CategoryResolver::new(&inference, timeout());

        let resolution = resolver.resolve("Gather facts about Queen of Denmark").await;

        assert_eq!(resolution.category, Category::Royalty);
        assert_eq!(resolution.topic, "queen of denmark");
    }

    #[test]
    fn recipes_outrank_brand_names() {
        assert_eq!(keyword_category("best apple pie recipes"), Some(Category::Cooking));
        assert_eq!(keyword_category("latest apple gadgets"), Some(Category::Tech));
    }

    #[test]
    fn keyword_matching_respects_word_boundaries() {
        assert_eq!(keyword_category("Find the product roadmap for our company"), None);
        assert_eq!(keyword_category("Looking for hiking trails"), Some(Category::Outdoor));
    }

    #[tokio::test]
    async fn inference_labels_are_parsed() {
        let inference = ScriptedInference::new().on("Respond in this exact format", "Topic: Electric Vehicles\nCategory: Technology\n");
        let resolver = CategoryResolver::new(&inference, timeout());

        let resolution = resolver.resolve("compare charging speeds of EVs").await;

        assert_eq!(resolution.category, Category::Tech);
        assert_eq!(resolution.label, "technology");
        assert_eq!(resolution.topic, "electric vehicles");
        assert_eq!(resolution.source, ResolutionSource::Inference);
    }

    #[tokio::test]
    async fn unknown_labels_keep_the_label_but_map_to_general() {
        let inference = ScriptedInference::new().on("Respond in this exact format", "Topic: online courses\nCategory: [education]");
        let resolver = CategoryResolver::new(&inference, timeout());

        let resolution = resolver.resolve("which online courses are accredited").await;

        assert_eq!(resolution.category, Category::General);
        assert_eq!(resolution.label, "education");
        assert_eq!(resolution.display_name(), "Education");
        assert_eq!(resolution.filename_stem(), "education_info");
    }

    #[tokio::test]
    async fn unparseable_or_failed_inference_defaults_to_general() {
        let garbled = ScriptedInference::new().on("Respond in this exact format", "I think this is about courses.");
        let resolution = CategoryResolver::new(&garbled, timeout())
            .resolve("which online courses are accredited")
            .await;
        assert_eq!(resolution.category, Category::General);
        assert_eq!(resolution.source, ResolutionSource::Default);

        let timed_out = ScriptedInference::new().fail_on("Respond in this exact format", InferenceError::Timeout { seconds: 1 });
        let resolution = CategoryResolver::new(&timed_out, timeout())
            .resolve("which online courses are accredited")
            .await;
        assert_eq!(resolution.category, Category::General);
        assert_eq!(resolution.label, "general");
    }

    #[test]
    fn similar_categories_follow_label_families() {
        assert_eq!(Category::similar_to("angling tips"), vec![Category::Fishing, Category::Outdoor]);
        assert_eq!(Category::similar_to("tech news"), vec![Category::News, Category::Tech]);
        assert_eq!(Category::similar_to("British monarchy"), vec![Category::Royalty, Category::Biographies]);
        assert!(Category::similar_to("astronomy").is_empty());
    }

    #[test]
    fn filename_stems_for_guides() {
        let resolution = CategoryResolution::new(Category::Fishing, "trout".to_string(), ResolutionSource::Keywords);
        assert_eq!(resolution.filename_stem(), "fishing_guide");
        assert_eq!(resolution.display_name(), "Fishing");
    }
}
