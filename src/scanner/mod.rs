//! Scanner module for file discovery and document loading.
//!
//! This module provides functionality for:
//! - Sorted directory walking using jwalk
//! - Text extraction through a chain of [`TextSource`]s
//! - Unicode path normalization
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`document`]: Streaming a file's text into [`DocumentStatistics`]
//! - [`formats`]: PDF, Office, OpenDocument and RTF text sources
//! - [`path_utils`]: Path keys, masking and root-relative paths
//!
//! # Example
//!
//! ```no_run
//! use mostsimilar::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("."), WalkerConfig::default());
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("#{} {}", file.index, file.path.display()),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod document;
pub mod formats;
pub mod path_utils;
pub mod walker;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::SystemTime;

use crate::similarity::{Metric, SimHash128};
use crate::text::DocumentStatistics;

// Re-export main types
pub use document::{DocumentError, ExtractorChain, RawFileSource, TextSource};
pub use formats::{
    is_binary_container, DocxSource, LegacyOfficeSource, PdfSource, RtfSource, ZipXmlSource,
};
pub use walker::{is_allowed_text_file, Walker};

/// Metadata for a discovered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path to the file
    pub path: PathBuf,
    /// Position in discovery order
    pub index: usize,
    /// Last modification time, if the filesystem reported one
    pub modified: Option<SystemTime>,
}

impl FileEntry {
    /// Create a new FileEntry.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the file
    /// * `index` - Discovery index
    /// * `modified` - Last modification time
    #[must_use]
    pub fn new(path: PathBuf, index: usize, modified: Option<SystemTime>) -> Self {
        Self {
            path,
            index,
            modified,
        }
    }

    /// Builds an entry by reading the file's modification time.
    #[must_use]
    pub fn from_path(path: PathBuf, index: usize) -> Self {
        let modified = std::fs::metadata(&path).and_then(|m| m.modified()).ok();
        Self::new(path, index, modified)
    }
}

/// A loaded, non-empty document ready for comparison.
///
/// Immutable once built.
#[derive(Debug)]
pub struct Document {
    pub entry: FileEntry,
    pub stats: DocumentStatistics,
    signature: OnceLock<SimHash128>,
}

impl Document {
    /// Wraps loaded statistics, precomputing the signature if `metric` uses one.
    #[must_use]
    pub fn new(entry: FileEntry, stats: DocumentStatistics, metric: Metric) -> Self {
        let signature = OnceLock::new();
        if metric.uses_signature() {
            let _ = signature.set(SimHash128::from_statistics(&stats));
        }
        Self {
            entry,
            stats,
            signature,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.entry.path
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.entry.index
    }

    /// The SimHash signature, computed on first use.
    #[must_use]
    pub fn signature(&self) -> SimHash128 {
        *self
            .signature
            .get_or_init(|| SimHash128::from_statistics(&self.stats))
    }

    /// The signature if it has already been computed.
    #[must_use]
    pub fn cached_signature(&self) -> Option<SimHash128> {
        self.signature.get().copied()
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Maximum depth below the root. `None` walks the whole tree,
    /// `Some(1)` lists only the root's own files.
    pub max_depth: Option<usize>,

    /// A directory whose contents are never visited.
    pub exclude_dir: Option<PathBuf>,

    /// Accept every regular file instead of only text-like extensions.
    pub all_extensions: bool,
}

impl WalkerConfig {
    /// Walk only the root directory itself.
    #[must_use]
    pub fn top_level_only(mut self) -> Self {
        self.max_depth = Some(1);
        self
    }

    /// Never descend into `dir`.
    #[must_use]
    pub fn with_exclude_dir(mut self, dir: PathBuf) -> Self {
        self.exclude_dir = Some(dir);
        self
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
