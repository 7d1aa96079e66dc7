//! All-pairs best-match search.
//!
//! For every document, find the partner with the highest similarity. A
//! partner replaces the current best only on a strict improvement, and
//! partners are visited in ascending index order, so the earliest partner
//! wins ties.
//!
//! Two passes produce the same table:
//! - [`best_match_table`] visits each unordered pair once and updates both
//!   rows
//! - [`best_match_table_parallel`] gives each row to one rayon task, which
//!   scans every other row in ascending order
//!
//! They agree because every metric is bit-symmetric: `score(i, j)` and
//! `score(j, i)` are the same `f64`.

use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::progress::ProgressCallback;
use crate::scanner::Document;
use crate::similarity::{similarity, Metric};

/// Phase name reported to progress callbacks.
pub const SCORING_PHASE: &str = "scoring";

/// One row of the best-match table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchRecord {
    /// Index of the most similar other document, if any was compared.
    pub best: Option<usize>,
    /// Score against `best`; negative infinity before any comparison.
    pub score: f64,
}

impl MatchRecord {
    pub const NO_MATCH: Self = Self {
        best: None,
        score: f64::NEG_INFINITY,
    };

    /// Records `partner` if `score` strictly improves on the current best.
    fn offer(&mut self, partner: usize, score: f64) {
        if score > self.score {
            self.score = score;
            self.best = Some(partner);
        }
    }
}

impl Default for MatchRecord {
    fn default() -> Self {
        Self::NO_MATCH
    }
}

/// Best partner and score for every document, indexed like the input.
#[derive(Debug, Clone, PartialEq)]
pub struct BestMatchTable {
    records: Vec<MatchRecord>,
}

impl BestMatchTable {
    #[must_use]
    pub fn from_records(records: Vec<MatchRecord>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&MatchRecord> {
        self.records.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MatchRecord> + '_ {
        self.records.iter()
    }

    /// The partner of `index` if each is the other's best match.
    #[must_use]
    pub fn reciprocal_partner(&self, index: usize) -> Option<usize> {
        let partner = self.records.get(index)?.best?;
        if partner != index && self.records.get(partner)?.best == Some(index) {
            Some(partner)
        } else {
            None
        }
    }
}

impl std::ops::Index<usize> for BestMatchTable {
    type Output = MatchRecord;

    fn index(&self, index: usize) -> &Self::Output {
        &self.records[index]
    }
}

/// Sequential pass over every unordered pair of `docs`.
#[must_use]
pub fn best_match_table(
    docs: &[Document],
    metric: Metric,
    progress: Option<&dyn ProgressCallback>,
) -> BestMatchTable {
    best_match_table_with(
        docs.len(),
        |i, j| similarity(&docs[i], &docs[j], metric),
        |row| report_row(progress, docs, row),
    )
}

/// Row-owned parallel pass over `docs`.
///
/// Runs on the current rayon pool; call inside `ThreadPool::install` to pick
/// the pool.
#[must_use]
pub fn best_match_table_parallel(
    docs: &[Document],
    metric: Metric,
    progress: Option<&dyn ProgressCallback>,
) -> BestMatchTable {
    let done = AtomicUsize::new(0);
    best_match_table_parallel_with(
        docs.len(),
        |i, j| similarity(&docs[i], &docs[j], metric),
        |row| {
            let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(callback) = progress {
                callback.on_progress(finished, &docs[row].path().to_string_lossy());
            }
        },
    )
}

fn report_row(progress: Option<&dyn ProgressCallback>, docs: &[Document], row: usize) {
    if let Some(callback) = progress {
        callback.on_progress(row + 1, &docs[row].path().to_string_lossy());
    }
}

/// Sequential pass over `n` items scored by `score(i, j)` with `i < j`.
pub fn best_match_table_with<F, P>(n: usize, score: F, mut on_row: P) -> BestMatchTable
where
    F: Fn(usize, usize) -> f64,
    P: FnMut(usize),
{
    let mut records = vec![MatchRecord::NO_MATCH; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let s = score(i, j);
            log::trace!("score({i}, {j}) = {s:.8}");
            records[i].offer(j, s);
            records[j].offer(i, s);
        }
        on_row(i);
    }
    BestMatchTable { records }
}

/// Row-owned parallel pass. `score` must be symmetric for the result to
/// match [`best_match_table_with`]; it is always called with `i < j`.
pub fn best_match_table_parallel_with<F, P>(n: usize, score: F, on_row: P) -> BestMatchTable
where
    F: Fn(usize, usize) -> f64 + Sync,
    P: Fn(usize) + Sync,
{
    let records = (0..n)
        .into_par_iter()
        .map(|i| {
            let mut record = MatchRecord::NO_MATCH;
            for j in (0..n).filter(|&j| j != i) {
                let s = if i < j { score(i, j) } else { score(j, i) };
                record.offer(j, s);
            }
            on_row(i);
            record
        })
        .collect();
    BestMatchTable { records }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::FileEntry;
    use crate::text::DocumentStatistics;
    use std::path::PathBuf;

    fn docs(texts: &[&str], metric: Metric) -> Vec<Document> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let entry = FileEntry::new(PathBuf::from(format!("doc{i}.txt")), i, None);
                Document::new(entry, DocumentStatistics::from_text(text), metric)
            })
            .collect()
    }

    const CORPUS: &[&str] = &[
        "quarterly revenue report north region",
        "quarterly revenue report south region",
        "recipe flour sugar butter eggs",
        "recipe flour sugar butter milk",
        "unrelated astronomy telescope galaxy",
    ];

    #[test]
    fn test_empty_and_single() {
        assert!(best_match_table_with(0, |_, _| 1.0, |_| {}).is_empty());
        let table = best_match_table_with(1, |_, _| 1.0, |_| {});
        assert_eq!(table[0], MatchRecord::NO_MATCH);
    }

    #[test]
    fn test_first_partner_wins_ties() {
        // Every pair scores the same; each row keeps its lowest-index partner.
        let table = best_match_table_with(4, |_, _| 0.5, |_| {});
        assert_eq!(table[0].best, Some(1));
        assert_eq!(table[1].best, Some(0));
        assert_eq!(table[2].best, Some(0));
        assert_eq!(table[3].best, Some(0));

        let parallel = best_match_table_parallel_with(4, |_, _| 0.5, |_| {});
        assert_eq!(table, parallel);
    }

    #[test]
    fn test_pairs_found() {
        let docs = docs(CORPUS, Metric::TfIdf);
        let table = best_match_table(&docs, Metric::TfIdf, None);
        assert_eq!(table[0].best, Some(1));
        assert_eq!(table[1].best, Some(0));
        assert_eq!(table[2].best, Some(3));
        assert_eq!(table[3].best, Some(2));
        assert_eq!(table.reciprocal_partner(0), Some(1));
        assert_eq!(table.reciprocal_partner(2), Some(3));
    }

    #[test]
    fn test_zero_scores_still_pick_a_partner() {
        let table = best_match_table_with(3, |_, _| 0.0, |_| {});
        assert_eq!(table[2].best, Some(0));
        assert_eq!(table[2].score, 0.0);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        for metric in [Metric::TfIdf, Metric::SimHash, Metric::Euclidean] {
            let docs = docs(CORPUS, metric);
            let sequential = best_match_table(&docs, metric, None);
            for threads in [1, 2, 3, 8] {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .unwrap();
                let parallel = pool.install(|| best_match_table_parallel(&docs, metric, None));
                assert_eq!(sequential, parallel, "{metric} with {threads} threads");
            }
        }
    }

    #[test]
    fn test_reciprocal_partner_requires_mutual_best() {
        let table = BestMatchTable::from_records(vec![
            MatchRecord {
                best: Some(1),
                score: 0.9,
            },
            MatchRecord {
                best: Some(2),
                score: 0.95,
            },
            MatchRecord {
                best: Some(1),
                score: 0.95,
            },
        ]);
        assert_eq!(table.reciprocal_partner(0), None);
        assert_eq!(table.reciprocal_partner(1), Some(2));
        assert_eq!(table.reciprocal_partner(2), Some(1));
    }
}
