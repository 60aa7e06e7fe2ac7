//! Wine category definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of a wine.
///
/// The five known categories cover everything the cellar tracks today.
/// Input from external sources (imports, AI suggestions) may carry values
/// outside this set; those deserialize to [`WineCategory::Unknown`] instead
/// of failing, so a single odd record cannot poison a whole payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WineCategory {
    /// Still red wine.
    Red,
    /// Still white wine.
    White,
    /// Rosé.
    Rose,
    /// Sparkling wine.
    Sparkling,
    /// Dessert and fortified wine.
    Dessert,
    /// Anything not in the known set.
    #[serde(other)]
    Unknown,
}

impl WineCategory {
    /// The known categories, in display order. `Unknown` is deliberately
    /// absent: distributions and AI schemas only deal in real categories.
    pub const KNOWN: [WineCategory; 5] = [
        WineCategory::Red,
        WineCategory::White,
        WineCategory::Rose,
        WineCategory::Sparkling,
        WineCategory::Dessert,
    ];

    /// Returns the serialized (lowercase) form of this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            WineCategory::Red => "red",
            WineCategory::White => "white",
            WineCategory::Rose => "rose",
            WineCategory::Sparkling => "sparkling",
            WineCategory::Dessert => "dessert",
            WineCategory::Unknown => "unknown",
        }
    }

    /// Parses a category from its serialized form. Unrecognized values map
    /// to [`WineCategory::Unknown`], matching deserialization.
    pub fn parse(value: &str) -> WineCategory {
        match value {
            "red" => WineCategory::Red,
            "white" => WineCategory::White,
            "rose" => WineCategory::Rose,
            "sparkling" => WineCategory::Sparkling,
            "dessert" => WineCategory::Dessert,
            _ => WineCategory::Unknown,
        }
    }
}

impl Default for WineCategory {
    fn default() -> Self {
        Self::Red
    }
}

impl fmt::Display for WineCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
