use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::Arc;

use crate::research::category::Category;

/// Read-only source lists, built once and shared by every request.
#[derive(Debug, Clone)]
pub struct SourceTables {
    predefined: HashMap<Category, Vec<String>>,
    backup: HashMap<Category, Vec<String>>,
    generic: Vec<String>,
}

fn urls(list: &[&str]) -> Vec<String> {
    list.iter().map(|url| url.to_string()).collect()
}

lazy_static! {
    static ref STANDARD_TABLES: Arc<SourceTables> = Arc::new(SourceTables::standard());
}

impl SourceTables {
    pub fn new(
        predefined: HashMap<Category, Vec<String>>,
        backup: HashMap<Category, Vec<String>>,
        generic: Vec<String>,
    ) -> Self {
        Self {
            predefined,
            backup,
            generic,
        }
    }

    /// Process-wide instance of [`SourceTables::standard`].
    pub fn shared() -> Arc<SourceTables> {
        Arc::clone(&STANDARD_TABLES)
    }

    pub fn standard() -> Self {
        let predefined = HashMap::from([
            (Category::News, urls(&[
                "https://www.bbc.com/news",
                "https://www.cnn.com",
                "https://www.theguardian.com",
                "https://apnews.com",
                "https://www.aljazeera.com",
            ])),
            (Category::Gaming, urls(&[
                "https://www.ign.com",
                "https://www.gamespot.com",
                "https://www.polygon.com",
                "https://kotaku.com",
                "https://www.pcgamer.com",
            ])),
            (Category::Tech, urls(&[
                "https://www.theverge.com",
                "https://techcrunch.com",
                "https://www.wired.com",
                "https://arstechnica.com",
                "https://www.cnet.com",
            ])),
            (Category::Sports, urls(&[
                "https://www.espn.com",
                "https://sports.yahoo.com",
                "https://www.cbssports.com",
                "https://www.skysports.com",
                "https://www.sportingnews.com",
            ])),
            (Category::Health, urls(&[
                "https://www.webmd.com",
                "https://www.mayoclinic.org",
                "https://www.healthline.com",
                "https://www.nih.gov",
                "https://www.medicalnewstoday.com",
            ])),
            (Category::Finance, urls(&[
                "https://www.bloomberg.com",
                "https://www.cnbc.com",
                "https://www.forbes.com",
                "https://www.ft.com",
                "https://www.marketwatch.com",
            ])),
            (Category::Fishing, urls(&[
                "https://www.takemefishing.org",
                "https://www.fieldandstream.com/fishing",
                "https://www.bassmaster.com",
                "https://www.fishingworld.com.au",
                "https://www.in-fisherman.com",
            ])),
            (Category::Outdoor, urls(&[
                "https://www.outdoorlife.com",
                "https://www.backpacker.com",
                "https://www.outsideonline.com",
                "https://www.rei.com/learn",
                "https://www.adventure-journal.com",
            ])),
            (Category::Gardening, urls(&[
                "https://www.gardeningknowhow.com",
                "https://www.thespruce.com/gardening-4127766",
                "https://www.almanac.com/gardening",
                "https://www.bhg.com/gardening",
                "https://www.gardeners.com/how-to",
            ])),
            (Category::Cooking, urls(&[
                "https://www.allrecipes.com",
                "https://www.foodnetwork.com",
                "https://www.epicurious.com",
                "https://www.seriouseats.com",
                "https://www.bonappetit.com",
            ])),
            (Category::Royalty, urls(&[
                "https://www.royal.uk",
                "https://www.townandcountrymag.com/society/tradition",
                "https://www.tatler.com/royals",
                "https://www.hellomagazine.com/royalty",
                "https://www.vanityfair.com/style/royals",
            ])),
            (Category::Biographies, urls(&[
                "https://www.biography.com",
                "https://www.britannica.com/biography",
                "https://www.historynet.com",
                "https://www.notablebiographies.com",
                "https://www.famousbirthdays.com",
            ])),
        ]);

        let backup = HashMap::from([
            (Category::Entertainment, urls(&[
                "https://www.imdb.com",
                "https://www.rottentomatoes.com",
                "https://variety.com",
                "https://www.hollywoodreporter.com",
                "https://deadline.com",
                "https://en.wikipedia.org/wiki/Portal:Film",
            ])),
            (Category::News, urls(&[
                "https://www.reuters.com",
                "https://apnews.com",
                "https://www.bbc.com/news",
                "https://www.aljazeera.com",
                "https://www.npr.org",
                "https://www.economist.com",
            ])),
            (Category::Tech, urls(&[
                "https://www.theverge.com",
                "https://www.wired.com",
                "https://techcrunch.com",
                "https://arstechnica.com",
                "https://www.cnet.com",
                "https://www.technologyreview.com",
            ])),
            (Category::Sports, urls(&[
                "https://www.espn.com",
                "https://www.sports-reference.com",
                "https://www.cbssports.com",
                "https://www.skysports.com",
                "https://www.sportingnews.com",
                "https://theathletic.com",
            ])),
            (Category::Health, urls(&[
                "https://www.mayoclinic.org",
                "https://www.nih.gov",
                "https://www.webmd.com",
                "https://www.healthline.com",
                "https://medlineplus.gov",
                "https://www.cdc.gov",
            ])),
            (Category::Finance, urls(&[
                "https://www.bloomberg.com",
                "https://www.ft.com",
                "https://www.cnbc.com",
                "https://www.investopedia.com",
                "https://www.morningstar.com",
                "https://www.wsj.com",
            ])),
            (Category::Travel, urls(&[
                "https://www.lonelyplanet.com",
                "https://www.tripadvisor.com",
                "https://www.nationalgeographic.com/travel",
                "https://www.cntraveler.com",
                "https://www.afar.com",
                "https://www.fodors.com",
            ])),
            (Category::General, urls(&[
                "https://en.wikipedia.org",
                "https://www.britannica.com",
                "https://www.nationalgeographic.com",
                "https://www.smithsonianmag.com",
                "https://time.com",
                "https://www.reuters.com",
            ])),
        ]);

        let generic = urls(&[
            "https://en.wikipedia.org",
            "https://www.britannica.com",
            "https://www.nationalgeographic.com",
            "https://www.sciencedaily.com",
            "https://www.bbc.com",
        ]);

        Self::new(predefined, backup, generic)
    }

    pub fn predefined(&self, category: Category) -> Option<&[String]> {
        self.predefined
            .get(&category)
            .map(Vec::as_slice)
            .filter(|list| !list.is_empty())
    }

    pub fn backup(&self, category: Category) -> Option<&[String]> {
        self.backup
            .get(&category)
            .map(Vec::as_slice)
            .filter(|list| !list.is_empty())
    }

    /// Broad backup list used when no category-specific backup applies.
    pub fn general_backup(&self) -> &[String] {
        self.backup(Category::General).unwrap_or(self.generic.as_slice())
    }

    /// Last-resort reference sites for selection.
    pub fn generic(&self) -> &[String] {
        &self.generic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_has_a_source_list() {
        let tables = SourceTables::standard();
        for category in Category::ALL {
            assert!(
                tables.predefined(category).is_some() || tables.backup(category).is_some(),
                "{} has no sources",
                category
            );
        }
    }

    #[test]
    fn lists_have_no_duplicates() {
        let tables = SourceTables::standard();
        for category in Category::ALL {
            for list in [tables.predefined(category), tables.backup(category)].into_iter().flatten() {
                let mut sorted = list.to_vec();
                sorted.sort();
                sorted.dedup();
                assert_eq!(sorted.len(), list.len());
            }
        }
    }

    #[test]
    fn shared_tables_are_one_instance() {
        assert!(Arc::ptr_eq(&SourceTables::shared(), &SourceTables::shared()));
        assert_eq!(SourceTables::shared().generic().len(), 5);
    }
}
