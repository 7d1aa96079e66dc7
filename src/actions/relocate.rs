//! Moving duplicate files into a side folder.
//!
//! # Overview
//!
//! Each scheduled file is moved to `<duplicates>/<path relative to root>`.
//! Parent folders are created as needed. If the target already exists a
//! numbered name (`report_1.txt`, `report_2.txt`, ...) is used instead.
//! Moves try `rename` first and fall back to copy-then-remove, so the
//! duplicates folder may live on another filesystem.
//!
//! Per-file failures are collected in the [`RelocationReport`]; they never
//! stop the batch.
//!
//! # Example
//!
//! ```no_run
//! use mostsimilar::actions::relocate::relocate_duplicates;
//! use std::path::{Path, PathBuf};
//!
//! let root = Path::new("/data/docs");
//! let sources = vec![PathBuf::from("/data/docs/old/report.txt")];
//! let report = relocate_duplicates(&sources, root, &root.join("Duplicates")).unwrap();
//! println!("{}", report.summary());
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::scanner::path_utils::relative_to_root;

/// Highest numeric suffix tried by [`make_unique_path`].
pub const MAX_UNIQUE_SUFFIX: u32 = 1000;

/// Error type for relocation.
#[derive(Debug, Error)]
pub enum RelocateError {
    /// The source no longer exists.
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Every numbered variant of the target name is taken.
    #[error("no free name for {0} after {MAX_UNIQUE_SUFFIX} attempts")]
    NoUniqueName(PathBuf),

    /// The duplicates folder could not be created.
    #[error("failed to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Neither rename nor copy+remove succeeded.
    #[error("failed to move {from} to {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Outcome of a relocation batch.
#[derive(Debug, Clone, Default)]
pub struct RelocationReport {
    /// `(source, target)` of every file that was moved.
    pub moved: Vec<(PathBuf, PathBuf)>,
    /// Files that stayed in place, with the reason.
    pub failed: Vec<(PathBuf, String)>,
}

impl RelocationReport {
    #[must_use]
    pub fn moved_count(&self) -> usize {
        self.moved.len()
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    /// Short human-readable summary.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.failed.is_empty() {
            format!("moved {} file(s)", self.moved.len())
        } else {
            format!(
                "moved {} file(s), {} could not be moved",
                self.moved.len(),
                self.failed.len()
            )
        }
    }
}

/// `path` if it is free, else the first free `<stem>_<N><.ext>` beside it.
///
/// # Errors
///
/// Returns [`RelocateError::NoUniqueName`] if all suffixes up to
/// [`MAX_UNIQUE_SUFFIX`] are taken.
pub fn make_unique_path(path: &Path) -> Result<PathBuf, RelocateError> {
    if !path.exists() {
        return Ok(path.to_path_buf());
    }

    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (1..=MAX_UNIQUE_SUFFIX)
        .map(|n| parent.join(format!("{stem}_{n}{extension}")))
        .find(|candidate| !candidate.exists())
        .ok_or_else(|| RelocateError::NoUniqueName(path.to_path_buf()))
}

/// Removes the copy left by a failed move. Returns `false` if it stays.
fn discard_copy(target: &Path) -> bool {
    match fs::remove_file(target) {
        Ok(()) => true,
        Err(e) => {
            log::warn!(
                "Could not remove orphaned copy {} after a failed move: {}",
                target.display(),
                e
            );
            false
        }
    }
}

/// Moves `source` to `target`, falling back to copy+remove.
fn move_file(source: &Path, target: &Path) -> Result<(), RelocateError> {
    let move_error = |source_err| RelocateError::Move {
        from: source.to_path_buf(),
        to: target.to_path_buf(),
        source: source_err,
    };

    match fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(e) => {
            log::debug!(
                "rename {} failed ({}), copying instead",
                source.display(),
                e
            );
            fs::copy(source, target).map_err(move_error)?;
            if let Err(e) = fs::remove_file(source) {
                // Leave no second copy behind when the source stays.
                discard_copy(target);
                return Err(move_error(e));
            }
            Ok(())
        }
    }
}

/// Moves one file below `duplicates_dir`, keeping its path relative to `root`.
///
/// Returns the final target path.
///
/// # Errors
///
/// Returns an error if the source is gone, no free target name exists, or
/// the move fails.
pub fn relocate_file(
    source: &Path,
    root: &Path,
    duplicates_dir: &Path,
) -> Result<PathBuf, RelocateError> {
    if !source.exists() {
        return Err(RelocateError::NotFound(source.to_path_buf()));
    }

    let target = make_unique_path(&duplicates_dir.join(relative_to_root(source, root)))?;
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| RelocateError::CreateDir {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    move_file(source, &target)?;
    log::debug!("Moved {} -> {}", source.display(), target.display());
    Ok(target)
}

/// Moves every file in `sources` below `duplicates_dir`.
///
/// # Errors
///
/// Returns [`RelocateError::CreateDir`] if `duplicates_dir` itself cannot be
/// created. Per-file failures are reported in the returned
/// [`RelocationReport`] instead.
pub fn relocate_duplicates(
    sources: &[PathBuf],
    root: &Path,
    duplicates_dir: &Path,
) -> Result<RelocationReport, RelocateError> {
    let mut report = RelocationReport::default();
    if sources.is_empty() {
        return Ok(report);
    }

    fs::create_dir_all(duplicates_dir).map_err(|e| RelocateError::CreateDir {
        path: duplicates_dir.to_path_buf(),
        source: e,
    })?;

    for source in sources {
        match relocate_file(source, root, duplicates_dir) {
            Ok(target) => report.moved.push((source.clone(), target)),
            Err(e) => {
                log::warn!("Dedup: {e}");
                report.failed.push((source.clone(), e.to_string()));
            }
        }
    }

    Ok(report)
}
