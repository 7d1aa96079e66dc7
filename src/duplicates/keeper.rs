//! Keeper selection for near-duplicate pairs.
//!
//! Of two near-duplicates, the file to keep is decided by, in order:
//! 1. the filename marker ([`VersionDescriptor`]), higher wins
//! 2. the modification time, later wins; a known time beats an unknown one
//! 3. discovery order, earlier wins

use std::cmp::Ordering;
use std::time::SystemTime;

use super::heuristic::VersionDescriptor;
use crate::scanner::FileEntry;

/// Everything needed to rank one file against another.
#[derive(Debug, Clone)]
pub struct FileRank {
    pub version: VersionDescriptor,
    pub modified: Option<SystemTime>,
    pub discovery: usize,
}

impl FileRank {
    #[must_use]
    pub fn new(version: VersionDescriptor, modified: Option<SystemTime>, discovery: usize) -> Self {
        Self {
            version,
            modified,
            discovery,
        }
    }

    /// Ranks a discovered file by its name and metadata.
    #[must_use]
    pub fn from_entry(entry: &FileEntry) -> Self {
        Self::new(
            VersionDescriptor::from_path(&entry.path),
            entry.modified,
            entry.index,
        )
    }

    /// `Greater` means `self` should be kept over `other`.
    #[must_use]
    pub fn keep_priority(&self, other: &Self) -> Ordering {
        self.version
            .cmp(&other.version)
            .then_with(|| match (self.modified, other.modified) {
                (Some(l), Some(r)) => l.cmp(&r),
                (l, r) => l.is_some().cmp(&r.is_some()),
            })
            .then_with(|| other.discovery.cmp(&self.discovery))
    }
}

/// Which side of a pair should be moved aside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Picks the duplicate between two files. The other one is the keeper.
#[must_use]
pub fn choose_duplicate(left: &FileRank, right: &FileRank) -> Side {
    if left.keep_priority(right) == Ordering::Greater {
        Side::Right
    } else {
        Side::Left
    }
}

/// Index-based form of [`choose_duplicate`] over a rank table.
#[must_use]
pub fn duplicate_index(ranks: &[FileRank], left: usize, right: usize) -> usize {
    match choose_duplicate(&ranks[left], &ranks[right]) {
        Side::Left => left,
        Side::Right => right,
    }
}
