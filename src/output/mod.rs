//! Output formatters for match results.
//!
//! This module provides different output formats for a [`MatchReport`]:
//! - CSV for spreadsheet import ([`csv`])
//! - An ASCII table for the console ([`table`])
//!
//! Both render [`ReportRow`]s, which carry display paths masked relative to
//! the scanned root (`.../sub/file.txt`).
//!
//! # Example
//!
//! ```no_run
//! use mostsimilar::duplicates::MatchEngine;
//! use mostsimilar::output::{report_rows, table::TableOutput};
//! use mostsimilar::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let root = Path::new("docs");
//! let files = Walker::new(root, WalkerConfig::default()).collect_files().unwrap();
//! let report = MatchEngine::with_defaults().find_matches(files).unwrap();
//!
//! let rows = report_rows(&report, root);
//! print!("{}", TableOutput::new(&rows).render());
//! ```

pub mod csv;
pub mod table;

use std::path::{Path, PathBuf};

use crate::duplicates::MatchReport;
use crate::scanner::path_utils::{absolute_normalized, masked_path};
use crate::similarity::Metric;

// Re-export main types
pub use self::csv::{CsvOutput, CsvOutputError};
pub use table::TableOutput;

/// Decimal places used for every printed score.
pub const SCORE_DECIMALS: usize = 8;

/// Formats a score with [`SCORE_DECIMALS`] decimals.
#[must_use]
pub fn format_score(score: f64) -> String {
    format!("{score:.prec$}", prec = SCORE_DECIMALS)
}

/// One report line, ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    /// Left column; the file to keep for reciprocal pairs.
    pub file: String,
    /// Right column; empty if the file had no partner.
    pub most_similar: String,
    pub score: f64,
    pub pair_id: usize,
}

/// Converts the report's rows to display rows with paths masked under `root`.
#[must_use]
pub fn report_rows(report: &MatchReport, root: &Path) -> Vec<ReportRow> {
    report
        .rows
        .iter()
        .map(|row| ReportRow {
            file: masked_path(report.documents[row.file].path(), root),
            most_similar: row
                .partner
                .map(|p| masked_path(report.documents[p].path(), root))
                .unwrap_or_default(),
            score: row.score,
            pair_id: row.pair_id,
        })
        .collect()
}

/// Default CSV file name for a scan of `dir`: `<dir name>_mostsimilar.csv`.
///
/// SimHash and Euclidean runs get a `_hash` or `_euclidean` suffix. If the
/// directory has no usable name, its parent's name is used, then `output`.
///
/// ```
/// use mostsimilar::output::output_name_for_dir;
/// use mostsimilar::similarity::Metric;
/// use std::path::Path;
///
/// assert_eq!(output_name_for_dir(Path::new("/data/Reports"), Metric::TfIdf), "Reports_mostsimilar.csv");
/// assert_eq!(output_name_for_dir(Path::new("/data/Reports"), Metric::SimHash), "Reports_mostsimilar_hash.csv");
/// ```
#[must_use]
pub fn output_name_for_dir(dir: &Path, metric: Metric) -> String {
    let resolved = absolute_normalized(dir);
    let base = resolved
        .file_name()
        .or_else(|| resolved.parent().and_then(Path::file_name))
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "output".to_string());

    let suffix = match metric {
        Metric::TfIdf => "",
        Metric::SimHash => "_hash",
        Metric::Euclidean => "_euclidean",
    };
    format!("{base}_mostsimilar{suffix}.csv")
}

/// Default CSV path: the output name inside the current directory.
#[must_use]
pub fn default_output_path(dir: &Path, metric: Metric) -> PathBuf {
    PathBuf::from(output_name_for_dir(dir, metric))
}
