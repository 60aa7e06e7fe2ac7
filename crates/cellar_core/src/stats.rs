//! Aggregate statistics over the mirrored collection.

use entities::{CellarStats, WineRecord};
use tracing::warn;

/// Computes cellar statistics from a set of records.
///
/// Totals count every record. The category distribution only counts the
/// known categories; records carrying an unrecognized category are kept out
/// of it and flagged in the log instead of failing the whole computation.
pub fn compute_statistics(records: &[WineRecord]) -> CellarStats {
    let mut stats = CellarStats::empty();
    let mut unrecognized = 0usize;

    for record in records {
        let bottles = u64::from(record.quantity);
        stats.total_bottles += bottles;
        stats.total_value += f64::from(record.quantity) * record.price.unwrap_or(0.0);

        match stats.distribution.get_mut(&record.category) {
            Some(count) => *count += bottles,
            None => unrecognized += 1,
        }
    }

    if unrecognized > 0 {
        warn!(
            records = unrecognized,
            "Records with unrecognized categories left out of the distribution"
        );
    }

    stats
}
