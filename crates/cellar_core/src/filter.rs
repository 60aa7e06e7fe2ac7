//! Mirror filtering for search and category selection.

use entities::{WineCategory, WineRecord};
use serde::{Deserialize, Serialize};

/// Filter over the mirrored collection.
///
/// A search term matches case-insensitively as a substring of name,
/// producer or region; a category must match exactly. Both conditions must
/// hold. The empty filter passes everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellarFilter {
    /// Free-text search term.
    #[serde(default)]
    pub search: Option<String>,
    /// Category to restrict to.
    #[serde(default)]
    pub category: Option<WineCategory>,
}

impl CellarFilter {
    /// Creates the empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the search term.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Sets the category restriction.
    pub fn with_category(mut self, category: WineCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Whether a record passes this filter.
    pub fn matches(&self, wine: &WineRecord) -> bool {
        if let Some(category) = self.category {
            if wine.category != category {
                return false;
            }
        }

        if let Some(search) = &self.search {
            let term = search.trim().to_lowercase();
            if !term.is_empty() {
                let hit = wine.name.to_lowercase().contains(&term)
                    || wine.producer.to_lowercase().contains(&term)
                    || wine.region.to_lowercase().contains(&term);
                if !hit {
                    return false;
                }
            }
        }

        true
    }
}

/// Applies a filter to a snapshot of the mirror, preserving its order.
pub fn filter_wines(records: &[WineRecord], filter: &CellarFilter) -> Vec<WineRecord> {
    records
        .iter()
        .filter(|wine| filter.matches(wine))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use entities::NewWine;

    use super::*;

    fn cellar() -> Vec<WineRecord> {
        let mut barolo = NewWine::new("Barolo")
            .with_producer("Cascina Rossa")
            .with_category(WineCategory::Red);
        barolo.region = "Piemonte".to_string();
        let gavi = NewWine::new("Gavi di Gavi")
            .with_producer("La Scolca")
            .with_category(WineCategory::White);
        let franciacorta = NewWine::new("Franciacorta Brut")
            .with_producer("Ca' del Bosco")
            .with_category(WineCategory::Sparkling);

        vec![
            barolo.into_record("w1", "user-1", Utc::now()),
            gavi.into_record("w2", "user-1", Utc::now()),
            franciacorta.into_record("w3", "user-1", Utc::now()),
        ]
    }

    #[test]
    fn test_empty_filter_passes_everything() {
        let records = cellar();
        let filtered = filter_wines(&records, &CellarFilter::new());
        assert_eq!(filtered.len(), 3);
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let records = cellar();

        let filtered = filter_wines(&records, &CellarFilter::new().with_search("BAROLO"));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "Barolo");

        // Producer and region are searched too
        let filtered = filter_wines(&records, &CellarFilter::new().with_search("scolca"));
        assert_eq!(filtered.len(), 1);
        let filtered = filter_wines(&records, &CellarFilter::new().with_search("piemonte"));
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_blank_search_matches_all() {
        let records = cellar();
        let filtered = filter_wines(&records, &CellarFilter::new().with_search("   "));
        assert_eq!(filtered.len(), 3);
    }

    #[test]
    fn test_category_must_match_exactly() {
        let records = cellar();
        let filtered = filter_wines(
            &records,
            &CellarFilter::new().with_category(WineCategory::Sparkling),
        );
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "Franciacorta Brut");
    }

    #[test]
    fn test_search_and_category_combine() {
        let records = cellar();
        let filter = CellarFilter::new()
            .with_search("gavi")
            .with_category(WineCategory::Red);
        assert!(filter_wines(&records, &filter).is_empty());
    }

    #[test]
    fn test_filter_preserves_order() {
        let records = cellar();
        let filtered = filter_wines(&records, &CellarFilter::new());
        let names: Vec<_> = filtered.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["Barolo", "Gavi di Gavi", "Franciacorta Brut"]);
    }
}
