//! mostsimilar - document similarity and near-duplicate finder
//!
//! Finds, for every text-like file in a directory tree, the other file it is
//! most similar to (TF-IDF cosine, SimHash or Euclidean distance over term
//! frequencies). Reciprocal best matches are reported once with the file to
//! keep on the left, chosen from version and date markers in file names,
//! modification times and discovery order. Duplicates can be moved aside.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod similarity;
pub mod text;

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::actions::relocate_duplicates;
use crate::cli::{Cli, Commands, ConfigAction, MatchArgs, MetricArgs, ScanArgs};
use crate::config::Config;
use crate::duplicates::{default_threads, EngineConfig, MatchEngine};
use crate::error::{ExitCode, NoFilesFound};
use crate::output::{default_output_path, format_score, report_rows, CsvOutput, TableOutput};
use crate::progress::{Progress, WALKING_PHASE};
use crate::scanner::path_utils::is_under;
use crate::scanner::{Walker, WalkerConfig};
use crate::text::TextRules;

/// Runs the command described by `cli`.
///
/// # Errors
///
/// Returns an error for anything that stops the run before results are
/// produced. Partial relocation failures are reported through the returned
/// [`ExitCode`] instead.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    // `config save` may create the file an explicit path names.
    let may_create = matches!(&cli.command, Commands::Config(_));
    let config = match &cli.config {
        Some(path) => {
            if !may_create && !path.is_file() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Config::load_from_path(path)
        }
        None => Config::load(),
    }
    .context("Failed to load configuration")?;
    log::debug!("Effective configuration: {config:?}");

    match cli.command {
        Commands::Scan(args) => run_scan(&args, &config, cli.quiet),
        Commands::Match(args) => run_match(&args, &config, cli.quiet),
        Commands::Config(args) => run_config(args.action, cli.config.as_deref(), &config),
    }
}

fn run_config(action: ConfigAction, explicit: Option<&Path>, config: &Config) -> Result<ExitCode> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match action {
        ConfigAction::Path => {
            let path = match explicit {
                Some(path) => path.to_path_buf(),
                None => Config::config_path()?,
            };
            writeln!(out, "{}", path.display())?;
        }
        ConfigAction::Show => write!(out, "{}", config.to_toml()?)?,
        ConfigAction::Save => {
            let path = match explicit {
                Some(path) => {
                    config.save_to_path(path)?;
                    path.to_path_buf()
                }
                None => config.save()?,
            };
            log::info!("Configuration written to {}", path.display());
        }
    }
    Ok(ExitCode::Success)
}

/// Engine settings from the config file, overridden by command-line flags.
fn build_engine_config(args: &MetricArgs, config: &Config, quiet: bool) -> (EngineConfig, bool) {
    let rules = config.text_rules(args.case_folding, &args.stop_words);
    if TextRules::install(rules.clone()).is_err() {
        log::debug!("Text rules already installed; using the new rules for this run only");
    }

    let threads_given = args.threads.is_some() || config.threads.is_some();
    let threads = args
        .threads
        .map(usize::from)
        .or(config.threads)
        .unwrap_or_else(default_threads);
    let metric = args.requested_metric().unwrap_or(config.metric);

    let engine = EngineConfig::default()
        .with_threads(threads)
        .with_metric(metric)
        .with_parallel_scoring(config.parallel_scoring)
        .with_rules(Arc::new(rules))
        .with_progress_callback(Arc::new(Progress::new(quiet)));
    (engine, threads_given)
}

fn collect_files(
    root: &Path,
    walker_config: WalkerConfig,
    engine: &EngineConfig,
) -> Result<Vec<scanner::FileEntry>> {
    let walker = Walker::new(root, walker_config);
    walker.check_root()?;

    if let Some(callback) = &engine.progress_callback {
        callback.on_phase_start(WALKING_PHASE, 0);
    }
    let files = walker.collect_files();
    if let Some(callback) = &engine.progress_callback {
        callback.on_phase_end(WALKING_PHASE);
    }
    let files = files?;

    log::info!("Found {} candidate file(s) under {}", files.len(), root.display());
    if files.is_empty() {
        return Err(NoFilesFound(root.to_path_buf()).into());
    }
    Ok(files)
}

fn run_scan(args: &ScanArgs, config: &Config, quiet: bool) -> Result<ExitCode> {
    let (mut engine_config, threads_given) = build_engine_config(&args.metric, config, quiet);
    if args.sequential {
        engine_config = engine_config.with_parallel_scoring(false);
    }
    let metric = engine_config.metric;
    let threads = engine_config.threads;

    let root = args.path.as_path();
    let duplicates_dir = root.join(&config.duplicates_dir_name);
    let dedup_threshold = args.dedup.map(|t| t.unwrap_or(config.dedup_threshold));

    let mut walker_config = WalkerConfig {
        follow_symlinks: args.follow_symlinks,
        skip_hidden: args.skip_hidden,
        all_extensions: args.all_extensions,
        ..WalkerConfig::default()
    };
    if dedup_threshold.is_some() {
        walker_config = walker_config.with_exclude_dir(duplicates_dir.clone());
    }

    let files = collect_files(root, walker_config, &engine_config)?;
    let report = MatchEngine::new(engine_config)
        .find_matches(files)
        .context("Matching failed")?;

    let rows = report_rows(&report, root);
    if !args.no_table && !quiet {
        TableOutput::new(&rows)
            .write_to(io::stdout().lock())
            .context("Failed to print table")?;
    }

    let csv_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(root, metric));
    CsvOutput::new(&rows)
        .write_to_path(&csv_path)
        .context("Failed to write CSV")?;
    log::info!("CSV generated: {}", csv_path.display());

    let mut status = ExitCode::Success;
    if let Some(threshold) = dedup_threshold {
        let sources = report.duplicates(threshold, |path| is_under(path, &duplicates_dir));
        if sources.is_empty() {
            log::info!("Dedup: no matches at or above the threshold.");
        } else {
            match relocate_duplicates(&sources, root, &duplicates_dir) {
                Ok(relocation) => {
                    log::info!(
                        "Dedup: moved {} file(s) to {}",
                        relocation.moved_count(),
                        duplicates_dir.display()
                    );
                    if !relocation.all_succeeded() {
                        log::warn!(
                            "Dedup: {} file(s) could not be moved.",
                            relocation.failed_count()
                        );
                        status = ExitCode::Incomplete;
                    }
                }
                Err(e) => {
                    log::error!("Dedup: {e}");
                    status = ExitCode::Incomplete;
                }
            }
        }
    }

    if !threads_given {
        log::info!("Threads used (max): {threads}");
    }
    Ok(status)
}

fn run_match(args: &MatchArgs, config: &Config, quiet: bool) -> Result<ExitCode> {
    let (engine_config, threads_given) = build_engine_config(&args.metric, config, quiet);
    let threads = engine_config.threads;
    let engine = MatchEngine::new(engine_config);

    let sample = engine
        .load_sample(&args.sample)
        .with_context(|| format!("Cannot use sample {}", args.sample.display()))?;

    let mut walker_config = WalkerConfig::default();
    if !args.recursive {
        walker_config = walker_config.top_level_only();
    }
    let files = collect_files(&args.repo, walker_config, engine.config())?;
    let corpus = engine.load_documents(&files)?;

    let ranked = engine.rank_against(&sample, &corpus.documents);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (index, score) in ranked {
        writeln!(
            out,
            "{} {}",
            format_score(score),
            corpus.documents[index].path().display()
        )?;
    }

    if !threads_given {
        log::info!("Threads used (max): {threads}");
    }
    Ok(ExitCode::Success)
}
