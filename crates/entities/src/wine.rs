//! Wine record definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::WineCategory;

/// A wine as stored in the cellar.
///
/// Every record belongs to exactly one identity; `id`, `owner_id` and
/// `created_at` are fixed at creation and never change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WineRecord {
    /// Unique identifier, assigned by the store.
    pub id: String,
    /// Identity that owns this record.
    pub owner_id: String,
    /// Wine name.
    pub name: String,
    /// Producer or winery.
    pub producer: String,
    /// Vintage year, or a marker such as "NV" for non-vintage wines.
    pub vintage: String,
    /// Category of the wine.
    pub category: WineCategory,
    /// Grape variety.
    pub grape: String,
    /// Region of origin.
    pub region: String,
    /// Alcohol content, free form (e.g. "13.5% vol").
    pub alcohol_by_volume: Option<String>,
    /// Purchase price per bottle.
    pub price: Option<f64>,
    /// Bottles currently in the cellar.
    pub quantity: u32,
    /// Personal rating, 1 to 5. `None` means unrated.
    pub rating: Option<u8>,
    /// Tasting notes.
    pub notes: Option<String>,
    /// Suggested food pairing.
    pub pairing_suggestion: Option<String>,
    /// Reference to a label image.
    pub image_reference: Option<String>,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied fields for a new wine record.
///
/// The store assigns the id; the synchronization core stamps the owner and
/// the creation time. [`NewWine::into_record`] is the single construction
/// path shared by every backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewWine {
    /// Wine name.
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
    pub alcohol_by_volume: Option<String>,
    /// Purchase price per bottle.
    #[serde(default)]
    pub price: Option<f64>,
    /// Bottles to record. Defaults to one.
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Personal rating, 1 to 5.
    #[serde(default)]
    pub rating: Option<u8>,
    /// Tasting notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// Suggested food pairing.
    #[serde(default)]
    pub pairing_suggestion: Option<String>,
    /// Reference to a label image.
    #[serde(default)]
    pub image_reference: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

impl NewWine {
    /// Creates a new wine with the given name and defaults everywhere else.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: 1,
            ..Self::default()
        }
    }

    /// Sets the producer.
    pub fn with_producer(mut self, producer: impl Into<String>) -> Self {
        self.producer = producer.into();
        self
    }

    /// Sets the category.
    pub fn with_category(mut self, category: WineCategory) -> Self {
        self.category = category;
        self
    }

    /// Sets the bottle count.
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Sets the price per bottle.
    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// Builds the stored record from these fields.
    pub fn into_record(
        self,
        id: impl Into<String>,
        owner_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> WineRecord {
        WineRecord {
            id: id.into(),
            owner_id: owner_id.into(),
            name: self.name,
            producer: self.producer,
            vintage: self.vintage,
            category: self.category,
            grape: self.grape,
            region: self.region,
            alcohol_by_volume: self.alcohol_by_volume,
            price: self.price,
            quantity: self.quantity,
            rating: self.rating,
            notes: self.notes,
            pairing_suggestion: self.pairing_suggestion,
            image_reference: self.image_reference,
            created_at,
        }
    }
}

/// A partial update to a wine record.
///
/// Absent fields are left untouched. The identifier, owner and creation time
/// are not part of a patch, so they cannot be modified through one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WinePatch {
    /// New wine name.
    #[serde(default)]
    pub name: Option<String>,
    /// New producer.
    #[serde(default)]
    pub producer: Option<String>,
    /// New vintage.
    #[serde(default)]
    pub vintage: Option<String>,
    /// New category.
    #[serde(default)]
    pub category: Option<WineCategory>,
    /// New grape variety.
    #[serde(default)]
    pub grape: Option<String>,
    /// New region.
    #[serde(default)]
    pub region: Option<String>,
    /// New alcohol content.
    #[serde(default)]
    pub alcohol_by_volume: Option<String>,
    /// New price per bottle.
    #[serde(default)]
    pub price: Option<f64>,
    /// New bottle count.
    #[serde(default)]
    pub quantity: Option<u32>,
    /// New rating.
    #[serde(default)]
    pub rating: Option<u8>,
    /// New tasting notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// New pairing suggestion.
    #[serde(default)]
    pub pairing_suggestion: Option<String>,
    /// New label image reference.
    #[serde(default)]
    pub image_reference: Option<String>,
}

impl WinePatch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bottle count.
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// Sets the rating.
    pub fn with_rating(mut self, rating: u8) -> Self {
        self.rating = Some(rating);
        self
    }

    /// Returns true when the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.producer.is_none()
            && self.vintage.is_none()
            && self.category.is_none()
            && self.grape.is_none()
            && self.region.is_none()
            && self.alcohol_by_volume.is_none()
            && self.price.is_none()
            && self.quantity.is_none()
            && self.rating.is_none()
            && self.notes.is_none()
            && self.pairing_suggestion.is_none()
            && self.image_reference.is_none()
    }

    /// Applies this patch to a record in place.
    pub fn apply_to(&self, record: &mut WineRecord) {
        if let Some(name) = &self.name {
            record.name = name.clone();
        }
        if let Some(producer) = &self.producer {
            record.producer = producer.clone();
        }
        if let Some(vintage) = &self.vintage {
            record.vintage = vintage.clone();
        }
        if let Some(category) = self.category {
            record.category = category;
        }
        if let Some(grape) = &self.grape {
            record.grape = grape.clone();
        }
        if let Some(region) = &self.region {
            record.region = region.clone();
        }
        if let Some(alcohol) = &self.alcohol_by_volume {
            record.alcohol_by_volume = Some(alcohol.clone());
        }
        if let Some(price) = self.price {
            record.price = Some(price);
        }
        if let Some(quantity) = self.quantity {
            record.quantity = quantity;
        }
        if let Some(rating) = self.rating {
            record.rating = Some(rating);
        }
        if let Some(notes) = &self.notes {
            record.notes = Some(notes.clone());
        }
        if let Some(pairing) = &self.pairing_suggestion {
            record.pairing_suggestion = Some(pairing.clone());
        }
        if let Some(image) = &self.image_reference {
            record.image_reference = Some(image.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_record_keeps_fields() {
        let now = Utc::now();
        let record = NewWine::new("Barolo Riserva")
            .with_producer("Cascina Rossa")
            .with_category(WineCategory::Red)
            .with_quantity(3)
            .with_price(45.0)
            .into_record("wine-1", "user-1", now);

        assert_eq!(record.id, "wine-1");
        assert_eq!(record.owner_id, "user-1");
        assert_eq!(record.name, "Barolo Riserva");
        assert_eq!(record.quantity, 3);
        assert_eq!(record.price, Some(45.0));
        assert_eq!(record.created_at, now);
        assert_eq!(record.rating, None);
    }

    #[test]
    fn test_new_wine_defaults() {
        let wine = NewWine::new("Soave");
        assert_eq!(wine.category, WineCategory::Red);
        assert_eq!(wine.quantity, 1);
        assert_eq!(wine.price, None);
    }

    #[test]
    fn test_new_wine_deserialize_defaults_quantity() {
        let wine: NewWine = serde_json::from_str(r#"{"name": "Soave"}"#).unwrap();
        assert_eq!(wine.quantity, 1);
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(WinePatch::new().is_empty());
        assert!(!WinePatch::new().with_quantity(2).is_empty());
    }

    #[test]
    fn test_patch_apply_leaves_absent_fields() {
        let mut record = NewWine::new("Chianti")
            .with_producer("Le Torri")
            .into_record("wine-1", "user-1", Utc::now());
        let patch = WinePatch {
            region: Some("Toscana".to_string()),
            rating: Some(4),
            ..WinePatch::default()
        };

        patch.apply_to(&mut record);

        assert_eq!(record.region, "Toscana");
        assert_eq!(record.rating, Some(4));
        assert_eq!(record.name, "Chianti");
        assert_eq!(record.producer, "Le Torri");
    }
}
