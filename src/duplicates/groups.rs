//! Output rows and duplicate resolution.
//!
//! # Overview
//!
//! Turns a [`BestMatchTable`] into two things:
//!
//! - the report rows, one per document, except that a reciprocal pair
//!   (each file is the other's best match) is reported once with the keeper
//!   on the left
//! - the relocation schedule, i.e. which files are duplicates at a given
//!   threshold
//!
//! # Example
//!
//! ```
//! use mostsimilar::duplicates::{build_rows, BestMatchTable, FileRank, MatchRecord, VersionDescriptor};
//!
//! let table = BestMatchTable::from_records(vec![
//!     MatchRecord { best: Some(1), score: 0.9 },
//!     MatchRecord { best: Some(0), score: 0.9 },
//! ]);
//! let ranks = vec![
//!     FileRank::new(VersionDescriptor::from_stem("notes_v2"), None, 0),
//!     FileRank::new(VersionDescriptor::from_stem("notes_v1"), None, 1),
//! ];
//! let rows = build_rows(&table, &ranks);
//! assert_eq!(rows.len(), 1);
//! assert_eq!((rows[0].file, rows[0].partner), (0, Some(1)));
//! ```

use std::collections::{HashMap, HashSet};

use super::keeper::{duplicate_index, FileRank};
use super::scoring::BestMatchTable;

/// Scores at or above this (after rounding to 8 decimals) form report pairs.
pub const OUTPUT_PAIR_THRESHOLD: f64 = 1e-8;

/// Half of the last printed decimal place.
const SCORE_EPSILON: f64 = 0.5e-8;

/// Whether `score` reaches `threshold` at the printed 8-decimal resolution.
///
/// A score that prints as `1.00000000` counts as 1.0.
#[must_use]
pub fn is_dedup_score(score: f64, threshold: f64) -> bool {
    score + SCORE_EPSILON >= threshold
}

/// Stable identifiers for unordered document pairs.
///
/// Identifiers start at 1 and are handed out in first-request order.
/// `(a, b)` and `(b, a)` share an id; `(a, a)` marks a document without a
/// partner.
#[derive(Debug, Default)]
pub struct PairIds {
    ids: HashMap<(usize, usize), usize>,
}

impl PairIds {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for `{left, right}`, assigning the next one if new.
    pub fn pair_id(&mut self, left: usize, right: usize) -> usize {
        let key = (left.min(right), left.max(right));
        let next = self.ids.len() + 1;
        *self.ids.entry(key).or_insert(next)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// One line of the report, by document index.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRow {
    /// Left column. For a reciprocal pair, the file to keep.
    pub file: usize,
    /// Right column. For a reciprocal pair, the duplicate candidate.
    pub partner: Option<usize>,
    pub score: f64,
    pub pair_id: usize,
    /// Whether this row stands for a reciprocal pair.
    pub reciprocal: bool,
}

/// Builds the report rows, sorted by descending score.
///
/// Rows are constructed in document order and pair ids are assigned as they
/// are constructed; the sort that follows is stable, so equal scores keep
/// construction order.
#[must_use]
pub fn build_rows(table: &BestMatchTable, ranks: &[FileRank]) -> Vec<MatchRow> {
    let mut pair_ids = PairIds::new();
    let mut rows = Vec::with_capacity(table.len());

    for (i, record) in table.iter().enumerate() {
        if let Some(partner) = reciprocal_at(table, i, OUTPUT_PAIR_THRESHOLD) {
            let duplicate = duplicate_index(ranks, i, partner);
            if duplicate == i {
                // Emitted from the keeper's side.
                continue;
            }
            rows.push(MatchRow {
                file: i,
                partner: Some(duplicate),
                score: record.score,
                pair_id: pair_ids.pair_id(i, duplicate),
                reciprocal: true,
            });
            continue;
        }

        let pair_id = match record.best {
            Some(partner) => pair_ids.pair_id(i, partner),
            None => pair_ids.pair_id(i, i),
        };
        rows.push(MatchRow {
            file: i,
            partner: record.best,
            score: record.score,
            pair_id,
            reciprocal: false,
        });
    }

    rows.sort_by(|a, b| b.score.total_cmp(&a.score));
    rows
}

/// The reciprocal partner of `index` when both directions reach `threshold`.
fn reciprocal_at(table: &BestMatchTable, index: usize, threshold: f64) -> Option<usize> {
    let partner = table.reciprocal_partner(index)?;
    let both_pass =
        is_dedup_score(table[index].score, threshold) && is_dedup_score(table[partner].score, threshold);
    both_pass.then_some(partner)
}

/// Which files to move aside at `threshold`, in scheduling order.
///
/// A document qualifies when its best score reaches the threshold:
/// - in a reciprocal pair, the pair's duplicate is scheduled (once)
/// - otherwise the document itself is scheduled and its best match stays
///
/// Files already scheduled, and files for which `excluded` returns true
/// (typically those already inside the duplicates folder), are skipped.
#[must_use]
pub fn resolve_duplicates<F>(
    table: &BestMatchTable,
    ranks: &[FileRank],
    threshold: f64,
    excluded: F,
) -> Vec<usize>
where
    F: Fn(usize) -> bool,
{
    let mut seen = HashSet::new();
    let mut scheduled = Vec::new();

    for (i, record) in table.iter().enumerate() {
        if record.best.is_none() || !is_dedup_score(record.score, threshold) {
            continue;
        }
        let candidate = match reciprocal_at(table, i, threshold) {
            Some(partner) => duplicate_index(ranks, i, partner),
            None => i,
        };
        if excluded(candidate) {
            log::debug!("Dedup: skipping document {candidate}, excluded");
            continue;
        }
        if seen.insert(candidate) {
            scheduled.push(candidate);
        }
    }

    scheduled
}
