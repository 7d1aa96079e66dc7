//! Euclidean distance between term-frequency vectors.

use super::UnionCounts;
use crate::text::DocumentStatistics;

fn frequency(count: u64, total: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

/// L2 distance between the documents' normalized term frequencies.
///
/// Ranges over `[0, √2]`; 0 means identical frequency profiles.
#[must_use]
pub fn euclidean_distance(left: &DocumentStatistics, right: &DocumentStatistics) -> f64 {
    let sum: f64 = UnionCounts::new(left, right)
        .map(|(l, r)| {
            let d = frequency(l, left.total()) - frequency(r, right.total());
            d * d
        })
        .sum();
    sum.sqrt()
}

/// Maps a distance from [`euclidean_distance`] onto `[0, 1]`.
#[must_use]
pub fn distance_to_similarity(distance: f64) -> f64 {
    (1.0 - distance / std::f64::consts::SQRT_2).clamp(0.0, 1.0)
}
