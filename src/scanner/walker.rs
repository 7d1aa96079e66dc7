//! Directory walker implementation using jwalk.
//!
//! # Overview
//!
//! [`Walker`] collects the regular files under a root in a deterministic,
//! name-sorted order. Each accepted file gets a discovery index equal to its
//! position in that order; the index is the final tie-breaker when choosing
//! which of two near-duplicates to keep.
//!
//! # Features
//!
//! - Sorted traversal (same tree, same indices)
//! - Text-like extension filter ([`is_allowed_text_file`])
//! - Optional depth limit and an excluded directory that is never descended
//! - Hidden file filtering
//!
//! # Example
//!
//! ```no_run
//! use mostsimilar::scanner::{Walker, WalkerConfig};
//! use std::path::{Path, PathBuf};
//!
//! let config = WalkerConfig::default().with_exclude_dir(PathBuf::from("corpus/Duplicates"));
//! let walker = Walker::new(Path::new("corpus"), config);
//! let files = walker.collect_files().expect("readable root");
//! println!("Found {} files", files.len());
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use jwalk::WalkDir;

use super::path_utils::absolute_normalized;
use super::{FileEntry, ScanError, WalkerConfig};

static ALLOWED_EXTENSIONS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "1", "1p", "3", "3p", "adoc", "ads", "adb", "ada", "ahk", "as", "asm", "asciidoc", "awk",
        "bash", "bas", "bat", "bib", "c", "c++", "cc", "cfg", "cl", "clj", "cljc", "cljs", "cmake",
        "cmd", "cob", "cbl", "coffee", "conf", "cp", "cpp", "cppm", "cs", "csproj", "csx", "css",
        "csv", "cxx", "d", "dart", "diff", "doc", "docm", "docx", "dot", "dotm", "dotx", "dpr",
        "dts", "dtsi", "edn", "el", "elm", "erl", "ex", "exs", "f", "f03", "f08", "f77", "f90",
        "f95", "fish", "for", "fs", "fsi", "fsproj", "fsx", "fpp", "go", "gql", "gradle", "groovy",
        "gvy", "gyp", "gypi", "h", "h++", "hxx", "hh", "hpp", "hrl", "hs", "htm", "html", "idl",
        "inc", "inl", "ini", "ipp", "ipynb", "ixx", "java", "jl", "js", "json", "jsx", "kt",
        "kts", "less", "lhs", "lisp", "log", "lua", "m", "make", "markdown", "md", "mk", "mm",
        "mjs", "cjs", "ml", "mli", "mll", "mly", "mpp", "nim", "odin", "odp", "ods", "odt", "pas",
        "p", "php", "phtml", "phps", "pl", "pm", "pod", "pp", "proto", "ps1", "psd1", "psm1", "py",
        "pyi", "pyw", "pyx", "pxd", "qml", "qbs", "r", "rake", "rmd", "rb", "rei", "res", "rst",
        "rs", "rtf", "s", "scala", "sc", "scm", "scss", "sh", "sql", "ss", "sld", "sty", "sv",
        "svh", "svg", "swift", "t", "tex", "thrift", "toml", "ts", "tsv", "tsx", "txt", "vala",
        "vapi", "vb", "vba", "vbs", "v", "vh", "vhd", "vhdl", "vue", "xaml", "xsd", "xsl", "xslt",
        "xml", "yaml", "yml", "zsh", "zig", "pdf", "pot", "potm", "potx", "pps", "ppsm", "ppsx",
        "ppt", "pptm", "pptx", "xls", "xlsm", "xlsx", "xlt", "xltm", "xltx",
    ]
    .into_iter()
    .collect()
});

/// Returns `true` if the file's extension marks a text-bearing document.
///
/// Matching is case-insensitive. Files without an extension are rejected.
#[must_use]
pub fn is_allowed_text_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(ext.to_ascii_lowercase().as_str()))
}

/// Directory walker for sorted file discovery.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// # Arguments
    ///
    /// * `path` - Root directory to scan
    /// * `config` - Walker configuration options
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check that the root exists and is a directory.
    pub fn check_root(&self) -> Result<(), ScanError> {
        match std::fs::metadata(&self.root) {
            Ok(metadata) if metadata.is_dir() => Ok(()),
            Ok(_) => Err(ScanError::NotADirectory(self.root.clone())),
            Err(e) => self.handle_io_error(&self.root, e),
        }
    }

    /// Walk the directory tree, yielding file entries in sorted order.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration. Indices count accepted files only.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        let excluded = self.config.exclude_dir.as_deref().map(absolute_normalized);

        let mut walk_dir = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .skip_hidden(self.config.skip_hidden)
            .process_read_dir(move |_depth, _path, _read_dir_state, children| {
                // Sort children for deterministic output
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
                if let Some(excluded) = &excluded {
                    children.retain(|child| match child {
                        Ok(entry) => {
                            !(entry.file_type().is_dir()
                                && absolute_normalized(&entry.path()) == *excluded)
                        }
                        Err(_) => true,
                    });
                }
            });
        if let Some(depth) = self.config.max_depth {
            walk_dir = walk_dir.max_depth(depth);
        }

        let mut next_index = 0usize;
        walk_dir.into_iter().filter_map(move |entry_result| {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), std::borrow::ToOwned::to_owned);
                    return Some(self.handle_jwalk_error(path, e));
                }
            };

            let path = entry.path();
            if entry.file_type().is_dir() {
                return None;
            }
            if !self.config.all_extensions && !is_allowed_text_file(&path) {
                log::trace!("Skipping non-text file: {}", path.display());
                return None;
            }

            let metadata = match std::fs::metadata(&path) {
                Ok(m) => m,
                Err(e) => return Some(self.handle_io_error(&path, e)),
            };
            if !metadata.is_file() {
                return None;
            }

            let index = next_index;
            next_index += 1;
            Some(Ok(FileEntry::new(path, index, metadata.modified().ok())))
        })
    }

    /// Collect every file under the root, logging and skipping per-entry errors.
    ///
    /// Fails only if the root itself cannot be walked.
    pub fn collect_files(&self) -> Result<Vec<FileEntry>, ScanError> {
        self.check_root()?;
        let files: Vec<FileEntry> = self.walk().filter_map(Result::ok).collect();
        log::debug!("Discovered {} file(s) under {}", files.len(), self.root.display());
        Ok(files)
    }

    /// Handle I/O errors during file access.
    fn handle_io_error<T>(&self, path: &Path, error: std::io::Error) -> Result<T, ScanError> {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::PermissionDenied => {
                log::warn!("Permission denied: {}", path.display());
                Err(ScanError::PermissionDenied(path.to_path_buf()))
            }
            ErrorKind::NotFound => {
                log::debug!("File not found (may have been deleted): {}", path.display());
                Err(ScanError::NotFound(path.to_path_buf()))
            }
            _ => {
                log::warn!("I/O error for {}: {}", path.display(), error);
                Err(ScanError::Io {
                    path: path.to_path_buf(),
                    source: error,
                })
            }
        }
    }

    /// Handle jwalk errors.
    fn handle_jwalk_error<T>(&self, path: PathBuf, error: jwalk::Error) -> Result<T, ScanError> {
        log::warn!("Skipping path due to error: {}: {}", path.display(), error);
        Err(ScanError::Io {
            path,
            source: std::io::Error::other(error.to_string()),
        })
    }
}
