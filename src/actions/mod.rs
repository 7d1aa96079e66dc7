//! File actions module.
//!
//! This module provides functionality for:
//! - Moving duplicate files into a side folder, keeping their layout
//!
//! ```no_run
//! use mostsimilar::actions::relocate::relocate_file;
//! use std::path::Path;
//!
//! let root = Path::new("/data/docs");
//! let target = relocate_file(&root.join("draft.txt"), root, &root.join("Duplicates"));
//! ```

pub mod relocate;

// Re-export commonly used types
pub use relocate::{
    make_unique_path, relocate_duplicates, relocate_file, RelocateError, RelocationReport,
    MAX_UNIQUE_SUFFIX,
};
