//! Command-line interface definitions for mostsimilar.
//!
//! This module defines all CLI arguments, subcommands, and options using the clap derive API.
//! Global options (verbosity, config file, error format) apply to every
//! subcommand.
//!
//! # Example
//!
//! ```bash
//! # Best match for every file, CSV in the current directory
//! mostsimilar scan ~/Documents/reports
//!
//! # SimHash instead of TF-IDF, and move exact matches into reports/Duplicates
//! mostsimilar scan ~/Documents/reports --hash --dedup
//!
//! # Move anything scoring 0.97 or more
//! mostsimilar scan ~/Documents/reports --dedup 0.97
//!
//! # Rank a folder against one sample file
//! mostsimilar match letter.txt ~/Documents/letters --recursive
//!
//! # Write the effective settings to the config file
//! MOSTSIMILAR_METRIC=simhash mostsimilar config save
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::similarity::Metric;
use crate::text::CaseFolding;

/// Find the most similar document for every file in a tree.
///
/// Every text-like file is compared with every other one (TF-IDF cosine by
/// default) and its closest match is reported in a table and a CSV file.
/// Near-duplicates can be moved aside into a `Duplicates` folder.
#[derive(Debug, Parser)]
#[command(name = "mostsimilar")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file to use instead of the platform default
    #[arg(long, value_name = "PATH", global = true, env = "MOSTSIMILAR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Find the best match for every file in a directory tree
    Scan(ScanArgs),
    /// Rank the files of a directory by similarity to one sample file
    Match(MatchArgs),
    /// Show or write the configuration file
    Config(ConfigArgs),
}

/// Options shared by both subcommands.
#[derive(Debug, Args, Clone, Default)]
pub struct MetricArgs {
    /// Use SimHash signatures (same as --metric simhash)
    #[arg(long = "hash", conflicts_with = "metric")]
    pub hash: bool,

    /// Similarity metric
    #[arg(long, value_enum, value_name = "METRIC")]
    pub metric: Option<Metric>,

    /// Number of worker threads (default: available parallelism)
    #[arg(short = 'j', long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub threads: Option<u16>,

    /// How tokens are lowercased and split
    #[arg(long, value_enum, value_name = "MODE")]
    pub case_folding: Option<CaseFolding>,

    /// Extra stop word to ignore (can be specified multiple times)
    #[arg(long = "stop-word", value_name = "WORD")]
    pub stop_words: Vec<String>,
}

impl MetricArgs {
    /// The metric requested on the command line, if any.
    #[must_use]
    pub fn requested_metric(&self) -> Option<Metric> {
        if self.hash {
            Some(Metric::SimHash)
        } else {
            self.metric
        }
    }
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory to scan recursively
    #[arg(value_name = "DIR")]
    pub path: PathBuf,

    #[command(flatten)]
    pub metric: MetricArgs,

    /// Move duplicates into <DIR>/Duplicates; optional minimum score in [0, 1]
    ///
    /// Without a value, the configured threshold is used (1.0 unless changed),
    /// which only moves files whose best score rounds to 1.00000000.
    #[arg(
        long,
        value_name = "THRESHOLD",
        num_args = 0..=1,
        value_parser = parse_threshold
    )]
    pub dedup: Option<Option<f64>>,

    /// CSV output path (default: ./<DIR name>_mostsimilar[_hash].csv)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Do not print the table to stdout
    #[arg(long)]
    pub no_table: bool,

    /// Score on the main thread instead of the worker pool
    #[arg(long)]
    pub sequential: bool,

    /// Follow symbolic links during scan
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Scan files of every extension, not only text and office documents
    #[arg(long)]
    pub all_extensions: bool,
}

/// Arguments for the match subcommand.
#[derive(Debug, Args)]
pub struct MatchArgs {
    /// File to compare against
    #[arg(value_name = "SAMPLE")]
    pub sample: PathBuf,

    /// Directory holding the candidate files
    #[arg(value_name = "REPO")]
    pub repo: PathBuf,

    /// Include files in subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    #[command(flatten)]
    pub metric: MetricArgs,
}

/// Arguments for the config subcommand.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// What to do with the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum ConfigAction {
    /// Print the path of the configuration file
    Path,
    /// Print the effective configuration as TOML
    Show,
    /// Write the effective configuration to the configuration file
    Save,
}

/// Parses a dedup threshold in `[0, 1]`.
///
/// # Errors
///
/// Returns a message if `s` is not a finite number in range.
pub fn parse_threshold(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("invalid threshold: {s}"))?;
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(format!("threshold must be between 0 and 1, got {s}"));
    }
    Ok(value)
}
