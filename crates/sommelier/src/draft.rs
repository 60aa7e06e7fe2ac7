//! Draft records and suggestion merging.

use entities::{NewWine, WineCategory};
use serde::{Deserialize, Serialize};

use crate::{LabelAnalysis, WineSuggestion};

/// An in-progress, unsaved wine entry.
///
/// Text fields default to empty, the category to its default, the quantity
/// to one bottle. Suggestions merge into a draft under two different rules:
///
/// - a label analysis **overwrites** whatever the user typed, because the
///   photo shows the actual bottle;
/// - a text suggestion only **fills empty** fields, so partial manual entry
///   is never discarded.
///
/// The asymmetry is deliberate and load-bearing; do not unify the paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WineDraft {
    /// Wine name.
    #[serde(default)]
    pub name: String,
    /// Producer or winery.
    #[serde(default)]
    pub producer: String,
    /// Vintage year, or "NV".
    #[serde(default)]
    pub vintage: String,
    /// Category of the wine.
    #[serde(default)]
    pub category: WineCategory,
    /// Grape variety.
    #[serde(default)]
    pub grape: String,
    /// Region of origin.
    #[serde(default)]
    pub region: String,
    /// Alcohol content, free form.
    #[serde(default)]
    pub alcohol_by_volume: String,
    /// Purchase price per bottle.
    #[serde(default)]
    pub price: Option<f64>,
    /// Bottles to record.
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Suggested food pairing.
    #[serde(default)]
    pub pairing_suggestion: String,
    /// Tasting notes.
    #[serde(default)]
    pub notes: String,
}

fn default_quantity() -> u32 {
    1
}

impl Default for WineDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            producer: String::new(),
            vintage: String::new(),
            category: WineCategory::default(),
            grape: String::new(),
            region: String::new(),
            alcohol_by_volume: String::new(),
            price: None,
            quantity: 1,
            pairing_suggestion: String::new(),
            notes: String::new(),
        }
    }
}

impl WineDraft {
    /// Creates an empty draft: one bottle, default category.
    pub fn new() -> Self {
        Self::default()
    }

    /// The query sent to the text suggestion path, built from the name and
    /// producer. `None` while the name is still empty; a lookup needs at
    /// least a name to go on.
    pub fn suggestion_query(&self) -> Option<String> {
        let name = self.name.trim();
        if name.is_empty() {
            return None;
        }
        let producer = self.producer.trim();
        if producer.is_empty() {
            Some(name.to_string())
        } else {
            Some(format!("{name} {producer}"))
        }
    }

    /// Merges a label analysis into the draft. Every field the analysis
    /// filled overwrites the draft; empty suggestions leave the draft value
    /// in place. The tasting description lands in the notes.
    pub fn apply_label_analysis(&mut self, analysis: &LabelAnalysis) {
        overwrite(&mut self.name, &analysis.name);
        overwrite(&mut self.producer, &analysis.producer);
        overwrite(&mut self.vintage, &analysis.vintage);
        overwrite(&mut self.grape, &analysis.grape);
        overwrite(&mut self.region, &analysis.region);
        overwrite(&mut self.alcohol_by_volume, &analysis.alcohol_by_volume);
        overwrite(&mut self.pairing_suggestion, &analysis.pairing_suggestion);
        overwrite(&mut self.notes, &analysis.description);
        if let Some(category) = analysis.category {
            if category != WineCategory::Unknown {
                self.category = category;
            }
        }
    }

    /// Merges a text suggestion into the draft. Only fields the user has
    /// not filled are taken; the category only while the draft still has
    /// its default one.
    pub fn apply_suggestion(&mut self, suggestion: &WineSuggestion) {
        fill_empty(&mut self.name, &suggestion.name);
        fill_empty(&mut self.producer, &suggestion.producer);
        fill_empty(&mut self.vintage, &suggestion.vintage);
        fill_empty(&mut self.grape, &suggestion.grape);
        fill_empty(&mut self.region, &suggestion.region);
        fill_empty(&mut self.alcohol_by_volume, &suggestion.alcohol_by_volume);
        fill_empty(&mut self.pairing_suggestion, &suggestion.pairing_suggestion);
        if self.category == WineCategory::default() {
            if let Some(category) = suggestion.category {
                if category != WineCategory::Unknown {
                    self.category = category;
                }
            }
        }
    }

    /// Converts the draft into the fields of a new record. At least one
    /// bottle is recorded, empty optional strings become `None`, and new
    /// wines start unrated.
    pub fn into_new_wine(self) -> NewWine {
        NewWine {
            name: self.name,
            producer: self.producer,
            vintage: self.vintage,
            category: self.category,
            grape: self.grape,
            region: self.region,
            alcohol_by_volume: none_if_empty(self.alcohol_by_volume),
            price: self.price,
            quantity: self.quantity.max(1),
            rating: None,
            notes: none_if_empty(self.notes),
            pairing_suggestion: none_if_empty(self.pairing_suggestion),
            image_reference: None,
        }
    }
}

/// Overwrites `slot` when the suggestion carries a non-empty value.
fn overwrite(slot: &mut String, suggested: &Option<String>) {
    if let Some(value) = suggested {
        if !value.trim().is_empty() {
            *slot = value.clone();
        }
    }
}

/// Fills `slot` from the suggestion only while the slot is still empty.
fn fill_empty(slot: &mut String, suggested: &Option<String>) {
    if !slot.trim().is_empty() {
        return;
    }
    if let Some(value) = suggested {
        if !value.trim().is_empty() {
            *slot = value.clone();
        }
    }
}

fn none_if_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
