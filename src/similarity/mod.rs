//! Similarity metrics over [`DocumentStatistics`].
//!
//! Every metric is symmetric and bounded to `[0, 1]`:
//! - [`tfidf`]: cosine similarity of TF-IDF vectors with pairwise IDF
//! - [`simhash`]: 128-bit SimHash signatures compared by Hamming distance
//! - [`euclidean`]: L2 distance between term-frequency vectors
//!
//! [`similarity`] dispatches on a [`Metric`].

pub mod euclidean;
pub mod simhash;
pub mod tfidf;

use std::collections::btree_map;
use std::iter::Peekable;

use serde::{Deserialize, Serialize};

use crate::scanner::Document;
use crate::text::DocumentStatistics;

pub use euclidean::{distance_to_similarity, euclidean_distance};
pub use simhash::SimHash128;
pub use tfidf::tfidf_cosine;

/// Which similarity measure to score document pairs with.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Pairwise TF-IDF cosine similarity.
    #[default]
    #[value(name = "tfidf")]
    TfIdf,
    /// SimHash Hamming similarity.
    #[value(name = "simhash")]
    SimHash,
    /// Similarity derived from the L2 distance of term frequencies.
    Euclidean,
}

impl Metric {
    /// Whether documents should carry a precomputed signature.
    #[must_use]
    pub fn uses_signature(self) -> bool {
        matches!(self, Self::SimHash)
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TfIdf => write!(f, "tfidf"),
            Self::SimHash => write!(f, "simhash"),
            Self::Euclidean => write!(f, "euclidean"),
        }
    }
}

/// Scores two documents with `metric`.
///
/// Signatures are computed on the fly for documents loaded without one.
#[must_use]
pub fn similarity(left: &Document, right: &Document, metric: Metric) -> f64 {
    match metric {
        Metric::TfIdf => tfidf_cosine(&left.stats, &right.stats),
        Metric::SimHash => left.signature().similarity(&right.signature()),
        Metric::Euclidean => {
            distance_to_similarity(euclidean_distance(&left.stats, &right.stats))
        }
    }
}

/// Walks the union vocabulary of two documents in term order, yielding
/// `(left_count, right_count)` for each term.
pub(crate) struct UnionCounts<'a> {
    left: Peekable<btree_map::Iter<'a, String, u64>>,
    right: Peekable<btree_map::Iter<'a, String, u64>>,
}

impl<'a> UnionCounts<'a> {
    pub(crate) fn new(left: &'a DocumentStatistics, right: &'a DocumentStatistics) -> Self {
        Self {
            left: left.counts().iter().peekable(),
            right: right.counts().iter().peekable(),
        }
    }
}

impl Iterator for UnionCounts<'_> {
    type Item = (u64, u64);

    fn next(&mut self) -> Option<Self::Item> {
        match (self.left.peek(), self.right.peek()) {
            (Some((l_term, _)), Some((r_term, _))) => match l_term.cmp(r_term) {
                std::cmp::Ordering::Less => self.left.next().map(|(_, l)| (*l, 0)),
                std::cmp::Ordering::Greater => self.right.next().map(|(_, r)| (0, *r)),
                std::cmp::Ordering::Equal => {
                    let l = self.left.next().map_or(0, |(_, l)| *l);
                    let r = self.right.next().map_or(0, |(_, r)| *r);
                    Some((l, r))
                }
            },
            (Some(_), None) => self.left.next().map(|(_, l)| (*l, 0)),
            (None, Some(_)) => self.right.next().map(|(_, r)| (0, *r)),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::FileEntry;
    use std::path::PathBuf;

    fn doc(index: usize, text: &str, metric: Metric) -> Document {
        let entry = FileEntry::new(PathBuf::from(format!("doc{index}.txt")), index, None);
        Document::new(entry, DocumentStatistics::from_text(text), metric)
    }

    #[test]
    fn test_union_counts_merges_in_order() {
        let a = DocumentStatistics::from_text("apple cherry cherry");
        let b = DocumentStatistics::from_text("banana cherry");
        let merged: Vec<(u64, u64)> = UnionCounts::new(&a, &b).collect();
        assert_eq!(merged, vec![(1, 0), (0, 1), (2, 1)]);
    }

    #[test]
    fn test_self_similarity_is_one() {
        for metric in [Metric::TfIdf, Metric::SimHash, Metric::Euclidean] {
            let a = doc(0, "quarterly revenue grew across regions", metric);
            let b = doc(1, "quarterly revenue grew across regions", metric);
            assert!((similarity(&a, &b, metric) - 1.0).abs() < 1e-12, "{metric}");
        }
    }

    #[test]
    fn test_all_metrics_symmetric() {
        for metric in [Metric::TfIdf, Metric::SimHash, Metric::Euclidean] {
            let a = doc(0, "red green blue red yellow", metric);
            let b = doc(1, "blue blue purple green", metric);
            let ab = similarity(&a, &b, metric);
            let ba = similarity(&b, &a, metric);
            assert_eq!(ab.to_bits(), ba.to_bits(), "{metric}");
            assert!((0.0..=1.0).contains(&ab), "{metric}");
        }
    }

    #[test]
    fn test_signature_computed_on_demand() {
        let a = doc(0, "hello world", Metric::TfIdf);
        let b = doc(1, "hello world", Metric::SimHash);
        assert!(a.cached_signature().is_none());
        assert!(b.cached_signature().is_some());
        assert_eq!(similarity(&a, &b, Metric::SimHash), 1.0);
    }

    #[test]
    fn test_metric_display() {
        assert_eq!(Metric::TfIdf.to_string(), "tfidf");
        assert_eq!(Metric::SimHash.to_string(), "simhash");
        assert!(Metric::SimHash.uses_signature());
        assert!(!Metric::Euclidean.uses_signature());
    }
}
