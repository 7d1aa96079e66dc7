//! Path normalization and root-relative path helpers.
//!
//! Paths are compared in two ways:
//! - lexically, after making them absolute and resolving `.`/`..`
//!   ([`absolute_normalized`], [`is_under`], [`relative_to_root`])
//! - by Unicode key, after NFC normalization ([`path_key`]), so that a
//!   decomposed `cafe\u{0301}.txt` and a composed `café.txt` collide
//!
//! # Example
//!
//! ```
//! use mostsimilar::scanner::path_utils::{masked_path, path_key};
//! use std::path::Path;
//!
//! assert_eq!(path_key(Path::new("café.txt")), path_key(Path::new("cafe\u{0301}.txt")));
//! assert_eq!(
//!     masked_path(Path::new("/data/docs/a/b.txt"), Path::new("/data/docs")),
//!     ".../a/b.txt"
//! );
//! ```

use std::path::{Component, Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Normalize a path string to NFC (Composed) form.
#[must_use]
pub fn normalize_path_str(s: &str) -> String {
    s.nfc().collect()
}

/// Create a normalized comparison key for a path.
///
/// The path is made absolute and lexically normalized first, then NFC
/// normalized. Invalid UTF-8 is converted lossily.
#[must_use]
pub fn path_key(path: &Path) -> String {
    normalize_path_str(&absolute_normalized(path).to_string_lossy())
}

/// Resolves `path` against the current directory and removes `.` and `..`
/// components without touching the filesystem.
///
/// Falls back to the path as given if the current directory is unavailable.
#[must_use]
pub fn absolute_normalized(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// `path` relative to `root`, or `None` if it lies outside (or is) `root`.
fn strip_root(path: &Path, root: &Path) -> Option<PathBuf> {
    let path = absolute_normalized(path);
    let root = absolute_normalized(root);
    match path.strip_prefix(&root) {
        Ok(relative) if !relative.as_os_str().is_empty() => Some(relative.to_path_buf()),
        _ => None,
    }
}

/// Returns `true` if `path` is strictly inside `dir`.
#[must_use]
pub fn is_under(path: &Path, dir: &Path) -> bool {
    strip_root(path, dir).is_some()
}

/// `path` relative to `root`. Paths outside `root` fall back to their file
/// name.
#[must_use]
pub fn relative_to_root(path: &Path, root: &Path) -> PathBuf {
    strip_root(path, root).unwrap_or_else(|| {
        path.file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| path.to_path_buf())
    })
}

/// Replaces the `root` prefix with `.../` and uses `/` separators.
///
/// Paths outside `root` are returned absolute.
#[must_use]
pub fn masked_path(path: &Path, root: &Path) -> String {
    match strip_root(path, root) {
        Some(relative) => {
            let parts: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            format!(".../{}", parts.join("/"))
        }
        None => absolute_normalized(path).display().to_string(),
    }
}
