//! Pairwise TF-IDF cosine similarity.
//!
//! IDF is computed from the two documents being compared, not from a corpus:
//!
//! ```text
//! T      = total(A) + total(B)
//! idf(t) = ln((T + 1) / (count(t, A) + count(t, B) + 1)) + 1
//! w(t,d) = count(t, d) / total(d) * idf(t)
//! ```

use super::UnionCounts;
use crate::text::DocumentStatistics;

/// Cosine similarity of the two documents' TF-IDF vectors, in `[0, 1]`.
///
/// Returns 0 when either document is empty. Swapping the arguments gives a
/// bit-identical result.
///
/// # Example
///
/// ```
/// use mostsimilar::similarity::tfidf_cosine;
/// use mostsimilar::text::DocumentStatistics;
///
/// let a = DocumentStatistics::from_text("the cat sat on the mat");
/// let b = DocumentStatistics::from_text("the cat sat on the rug");
/// let score = tfidf_cosine(&a, &b);
/// assert!((score - 0.5735).abs() < 1e-3);
/// ```
#[must_use]
pub fn tfidf_cosine(left: &DocumentStatistics, right: &DocumentStatistics) -> f64 {
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let left_total = left.total() as f64;
    let right_total = right.total() as f64;
    let corpus_total = left_total + right_total;

    let mut dot = 0.0;
    let mut left_norm = 0.0;
    let mut right_norm = 0.0;
    for (left_count, right_count) in UnionCounts::new(left, right) {
        let idf = ((corpus_total + 1.0) / ((left_count + right_count) as f64 + 1.0)).ln() + 1.0;
        let left_weight = left_count as f64 / left_total * idf;
        let right_weight = right_count as f64 / right_total * idf;
        dot += left_weight * right_weight;
        left_norm += left_weight * left_weight;
        right_norm += right_weight * right_weight;
    }

    if left_norm <= 0.0 || right_norm <= 0.0 {
        return 0.0;
    }
    (dot / (left_norm.sqrt() * right_norm.sqrt())).clamp(0.0, 1.0)
}
