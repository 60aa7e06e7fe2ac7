//! Aggregate cellar statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::WineCategory;

/// Aggregate statistics over a cellar.
///
/// The distribution always carries every known category, including those
/// with zero bottles, so consumers never have to special-case missing keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellarStats {
    /// Total bottles across all records.
    pub total_bottles: u64,
    /// Total value: bottles times price, unpriced bottles count as zero.
    pub total_value: f64,
    /// Bottle count per known category.
    pub distribution: BTreeMap<WineCategory, u64>,
}

/// One non-empty slice of the category distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    /// The category.
    pub category: WineCategory,
    /// Bottles in this category.
    pub bottles: u64,
    /// Share of all bottles, in whole percent.
    pub percent: f64,
}

impl CellarStats {
    /// Statistics of an empty cellar: zero totals, every known category
    /// present at zero.
    pub fn empty() -> Self {
        let mut distribution = BTreeMap::new();
        for category in WineCategory::KNOWN {
            distribution.insert(category, 0);
        }
        Self {
            total_bottles: 0,
            total_value: 0.0,
            distribution,
        }
    }

    /// Average price per bottle, zero for an empty cellar.
    pub fn average_price(&self) -> f64 {
        if self.total_bottles == 0 {
            return 0.0;
        }
        self.total_value / self.total_bottles as f64
    }

    /// Per-category shares of the total bottle count. Categories without
    /// bottles are omitted.
    pub fn distribution_shares(&self) -> Vec<CategoryShare> {
        if self.total_bottles == 0 {
            return Vec::new();
        }
        self.distribution
            .iter()
            .filter(|(_, bottles)| **bottles > 0)
            .map(|(category, bottles)| CategoryShare {
                category: *category,
                bottles: *bottles,
                percent: (*bottles as f64 / self.total_bottles as f64 * 100.0).round(),
            })
            .collect()
    }
}

impl Default for CellarStats {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stats_seed_all_known_categories() {
        let stats = CellarStats::empty();
        assert_eq!(stats.total_bottles, 0);
        assert_eq!(stats.total_value, 0.0);
        assert_eq!(stats.distribution.len(), 5);
        assert!(stats.distribution.values().all(|count| *count == 0));
    }

    #[test]
    fn test_average_price_guards_empty_cellar() {
        assert_eq!(CellarStats::empty().average_price(), 0.0);
    }

    #[test]
    fn test_average_price() {
        let mut stats = CellarStats::empty();
        stats.total_bottles = 3;
        stats.total_value = 20.0;
        assert!((stats.average_price() - 20.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_distribution_shares_skip_zero_categories() {
        let mut stats = CellarStats::empty();
        stats.total_bottles = 4;
        stats.distribution.insert(WineCategory::Red, 3);
        stats.distribution.insert(WineCategory::White, 1);

        let shares = stats.distribution_shares();
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].category, WineCategory::Red);
        assert_eq!(shares[0].percent, 75.0);
        assert_eq!(shares[1].category, WineCategory::White);
        assert_eq!(shares[1].percent, 25.0);
    }
}
