//! Match engine: the loading, scoring and resolution pipeline.
//!
//! # Pipeline
//!
//! 1. **Loading** - every discovered file is streamed through the
//!    [`ExtractorChain`] on a fixed-size rayon pool. Workers claim files from
//!    a shared counter and keep their results in a private arena; the arenas
//!    are merged and put back in discovery order afterwards. Failed and empty
//!    files are dropped and reported as [`SkippedDocument`]s.
//! 2. **Scoring** - the all-pairs [`BestMatchTable`], sequential or
//!    row-parallel on the same pool.
//! 3. **Resolution** - [`MatchReport`] builds the report rows and, on
//!    request, the list of duplicates to move aside.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use super::groups::{build_rows, resolve_duplicates, MatchRow};
use super::keeper::FileRank;
use super::scoring::{best_match_table, best_match_table_parallel, BestMatchTable, SCORING_PHASE};
use crate::progress::ProgressCallback;
use crate::scanner::path_utils::path_key;
use crate::scanner::{Document, DocumentError, ExtractorChain, FileEntry};
use crate::similarity::{similarity, Metric};
use crate::text::{DocumentStatistics, TextRules};

/// Phase name reported to progress callbacks.
pub const LOADING_PHASE: &str = "loading";

/// Why a discovered file took no part in matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The file yielded no countable tokens.
    Empty,
    /// Every text source failed.
    Failed(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "no countable tokens"),
            Self::Failed(message) => write!(f, "{message}"),
        }
    }
}

/// A discovered file that was dropped during loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDocument {
    pub entry: FileEntry,
    pub reason: SkipReason,
}

/// Configuration for the match engine.
#[derive(Clone)]
pub struct EngineConfig {
    /// Worker threads for loading and parallel scoring.
    pub threads: usize,
    /// Similarity measure.
    pub metric: Metric,
    /// Score rows on the pool instead of the calling thread.
    pub parallel_scoring: bool,
    /// Text sources tried for every file.
    pub chain: Arc<ExtractorChain>,
    /// Stop words and case folding.
    pub rules: Arc<TextRules>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("threads", &self.threads)
            .field("metric", &self.metric)
            .field("parallel_scoring", &self.parallel_scoring)
            .field("chain", &self.chain)
            .field("rules", &self.rules)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            metric: Metric::default(),
            parallel_scoring: true,
            chain: Arc::new(ExtractorChain::default()),
            rules: TextRules::shared(),
            progress_callback: None,
        }
    }
}

/// The machine's available parallelism, or 1 if unknown.
#[must_use]
pub fn default_threads() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

impl EngineConfig {
    /// Set the worker thread count (at least 1).
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    #[must_use]
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    #[must_use]
    pub fn with_parallel_scoring(mut self, enabled: bool) -> Self {
        self.parallel_scoring = enabled;
        self
    }

    /// Set the extraction chain.
    #[must_use]
    pub fn with_chain(mut self, chain: ExtractorChain) -> Self {
        self.chain = Arc::new(chain);
        self
    }

    /// Set the text rules used for new documents.
    #[must_use]
    pub fn with_rules(mut self, rules: Arc<TextRules>) -> Self {
        self.rules = rules;
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }
}

/// Errors that can occur while matching.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    /// Fewer than two documents survived loading.
    #[error("Need at least two non-empty files to compare (found {usable})")]
    InsufficientCorpus {
        /// Number of usable documents
        usable: usize,
    },

    /// A sample document could not be used.
    #[error("Sample file must be non-empty: {path}")]
    EmptySample {
        /// Path to the sample
        path: PathBuf,
    },

    /// The sample document could not be read.
    #[error(transparent)]
    Sample(#[from] DocumentError),

    /// The worker pool could not be started.
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Documents that survived loading, plus the ones that did not.
#[derive(Debug, Default)]
pub struct LoadedCorpus {
    /// Usable documents in discovery order.
    pub documents: Vec<Document>,
    /// Dropped files in discovery order.
    pub skipped: Vec<SkippedDocument>,
}

/// Summary statistics from a match run.
#[derive(Debug, Clone, Default)]
pub struct MatchSummary {
    /// Files handed to the engine
    pub discovered: usize,
    /// Documents compared
    pub usable: usize,
    /// Files dropped because they had no tokens
    pub empty: usize,
    /// Files dropped because they could not be read
    pub failed: usize,
    /// Rows in the report
    pub rows: usize,
    /// Reciprocal pairs in the report
    pub reciprocal_pairs: usize,
    /// Time spent loading
    pub load_duration: Duration,
    /// Time spent scoring
    pub score_duration: Duration,
}

/// Result of a full match run.
#[derive(Debug)]
pub struct MatchReport {
    pub documents: Vec<Document>,
    pub skipped: Vec<SkippedDocument>,
    pub table: BestMatchTable,
    pub ranks: Vec<FileRank>,
    pub rows: Vec<MatchRow>,
    pub summary: MatchSummary,
}

impl MatchReport {
    /// Paths of the files to move aside at `threshold`, in scheduling order.
    ///
    /// `excluded` is asked about every candidate; files it rejects are left
    /// in place. Paths that normalize to the same key are scheduled once.
    #[must_use]
    pub fn duplicates<F>(&self, threshold: f64, excluded: F) -> Vec<PathBuf>
    where
        F: Fn(&Path) -> bool,
    {
        let indices = resolve_duplicates(&self.table, &self.ranks, threshold, |i| {
            excluded(self.documents[i].path())
        });

        let mut seen = std::collections::HashSet::new();
        indices
            .into_iter()
            .map(|i| self.documents[i].path())
            .filter(|path| seen.insert(path_key(path)))
            .map(Path::to_path_buf)
            .collect()
    }
}

/// Runs the loading, scoring and resolution pipeline.
///
/// # Example
///
/// ```no_run
/// use mostsimilar::duplicates::{EngineConfig, MatchEngine};
/// use mostsimilar::scanner::{Walker, WalkerConfig};
/// use std::path::Path;
///
/// let files = Walker::new(Path::new("docs"), WalkerConfig::default())
///     .collect_files()
///     .unwrap();
/// let engine = MatchEngine::new(EngineConfig::default().with_threads(4));
/// let report = engine.find_matches(files).unwrap();
/// for row in &report.rows {
///     println!("{} {:.8}", report.documents[row.file].path().display(), row.score);
/// }
/// ```
#[derive(Debug)]
pub struct MatchEngine {
    config: EngineConfig,
}

impl MatchEngine {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn progress(&self) -> Option<&dyn ProgressCallback> {
        self.config.progress_callback.as_deref()
    }

    fn build_pool(&self) -> Result<rayon::ThreadPool, EngineError> {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()
        {
            Ok(pool) => Ok(pool),
            Err(e) => {
                log::warn!(
                    "Failed to create pool with {} threads ({}), using rayon defaults",
                    self.config.threads,
                    e
                );
                Ok(rayon::ThreadPoolBuilder::new().build()?)
            }
        }
    }

    /// Reads one file into statistics using the configured chain and rules.
    ///
    /// # Errors
    ///
    /// Returns the chain's error if no source could read the file.
    pub fn load_statistics(&self, path: &Path) -> Result<DocumentStatistics, DocumentError> {
        let mut stats = DocumentStatistics::with_rules(Arc::clone(&self.config.rules));
        self.config.chain.extract_into(path, &mut stats)?;
        Ok(stats)
    }

    fn load_one(&self, entry: &FileEntry) -> Result<Document, SkippedDocument> {
        let skip = |reason| SkippedDocument {
            entry: entry.clone(),
            reason,
        };
        match self.load_statistics(&entry.path) {
            Ok(stats) if stats.is_empty() => Err(skip(SkipReason::Empty)),
            Ok(stats) => {
                log::trace!(
                    "Loaded {} ({} tokens, {} terms)",
                    entry.path.display(),
                    stats.total(),
                    stats.distinct_terms()
                );
                Ok(Document::new(entry.clone(), stats, self.config.metric))
            }
            Err(e) => Err(skip(SkipReason::Failed(e.to_string()))),
        }
    }

    /// Loads `files` concurrently.
    ///
    /// Results come back in the order of `files`, whatever the thread count.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ThreadPool`] if no worker pool can be built.
    pub fn load_documents(&self, files: &[FileEntry]) -> Result<LoadedCorpus, EngineError> {
        if files.is_empty() {
            return Ok(LoadedCorpus::default());
        }

        if let Some(callback) = self.progress() {
            callback.on_phase_start(LOADING_PHASE, files.len());
        }
        log::info!(
            "Loading {} file(s) with {} thread(s)",
            files.len(),
            self.config.threads
        );

        let pool = self.build_pool()?;
        let workers = self.config.threads.min(files.len()).max(1);
        let next = AtomicUsize::new(0);
        let done = AtomicUsize::new(0);

        let arenas: Vec<Vec<(usize, Result<Document, SkippedDocument>)>> = pool.install(|| {
            (0..workers)
                .into_par_iter()
                .map(|_| {
                    let mut arena = Vec::new();
                    loop {
                        let i = next.fetch_add(1, Ordering::Relaxed);
                        let Some(entry) = files.get(i) else {
                            break;
                        };
                        arena.push((i, self.load_one(entry)));
                        let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                        if let Some(callback) = self.progress() {
                            callback.on_progress(finished, &entry.path.to_string_lossy());
                        }
                    }
                    arena
                })
                .collect()
        });

        let mut merged: Vec<_> = arenas.into_iter().flatten().collect();
        merged.sort_unstable_by_key(|(i, _)| *i);

        let mut corpus = LoadedCorpus::default();
        for (_, result) in merged {
            match result {
                Ok(document) => corpus.documents.push(document),
                Err(skipped) => {
                    match &skipped.reason {
                        SkipReason::Empty => {
                            log::info!("Skipping {}: {}", skipped.entry.path.display(), skipped.reason);
                        }
                        SkipReason::Failed(_) => {
                            log::warn!("Skipping {}: {}", skipped.entry.path.display(), skipped.reason);
                        }
                    }
                    corpus.skipped.push(skipped);
                }
            }
        }

        if let Some(callback) = self.progress() {
            callback.on_phase_end(LOADING_PHASE);
        }
        log::info!(
            "Loaded {} document(s), skipped {}",
            corpus.documents.len(),
            corpus.skipped.len()
        );
        Ok(corpus)
    }

    /// Computes the best-match table for `documents`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ThreadPool`] if parallel scoring is enabled and
    /// no worker pool can be built.
    pub fn score(&self, documents: &[Document]) -> Result<BestMatchTable, EngineError> {
        if let Some(callback) = self.progress() {
            callback.on_phase_start(SCORING_PHASE, documents.len());
        }
        log::info!(
            "Scoring {} document(s) with {} metric",
            documents.len(),
            self.config.metric
        );

        let metric = self.config.metric;
        let table = if self.config.parallel_scoring {
            let pool = self.build_pool()?;
            pool.install(|| best_match_table_parallel(documents, metric, self.progress()))
        } else {
            best_match_table(documents, metric, self.progress())
        };

        if let Some(callback) = self.progress() {
            callback.on_phase_end(SCORING_PHASE);
        }
        Ok(table)
    }

    /// Loads, scores and resolves `files`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InsufficientCorpus`] if fewer than two files
    /// hold countable tokens.
    pub fn find_matches(&self, files: Vec<FileEntry>) -> Result<MatchReport, EngineError> {
        let mut summary = MatchSummary {
            discovered: files.len(),
            ..Default::default()
        };

        let started = Instant::now();
        let corpus = self.load_documents(&files)?;
        summary.load_duration = started.elapsed();
        summary.usable = corpus.documents.len();
        summary.empty = corpus
            .skipped
            .iter()
            .filter(|s| s.reason == SkipReason::Empty)
            .count();
        summary.failed = corpus.skipped.len() - summary.empty;

        if corpus.documents.len() < 2 {
            return Err(EngineError::InsufficientCorpus {
                usable: corpus.documents.len(),
            });
        }

        let started = Instant::now();
        let table = self.score(&corpus.documents)?;
        summary.score_duration = started.elapsed();

        let ranks: Vec<FileRank> = corpus
            .documents
            .iter()
            .map(|doc| FileRank::from_entry(&doc.entry))
            .collect();
        let rows = build_rows(&table, &ranks);
        summary.rows = rows.len();
        summary.reciprocal_pairs = rows.iter().filter(|row| row.reciprocal).count();

        log::info!(
            "Matched {} document(s): {} row(s), {} reciprocal pair(s)",
            summary.usable,
            summary.rows,
            summary.reciprocal_pairs
        );

        Ok(MatchReport {
            documents: corpus.documents,
            skipped: corpus.skipped,
            table,
            ranks,
            rows,
            summary,
        })
    }

    /// Loads `path` as a sample document.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or has no countable tokens.
    pub fn load_sample(&self, path: &Path) -> Result<Document, EngineError> {
        let stats = self.load_statistics(path)?;
        if stats.is_empty() {
            return Err(EngineError::EmptySample {
                path: path.to_path_buf(),
            });
        }
        let entry = FileEntry::from_path(path.to_path_buf(), 0);
        Ok(Document::new(entry, stats, self.config.metric))
    }

    /// Scores every document against `sample`.
    ///
    /// Returns `(position in documents, score)`, highest score first and
    /// ties broken by the path's raw bytes, so `a-b.txt` sorts before
    /// `a/b.txt`.
    #[must_use]
    pub fn rank_against(&self, sample: &Document, documents: &[Document]) -> Vec<(usize, f64)> {
        let metric = self.config.metric;
        let mut ranked: Vec<(usize, f64)> = documents
            .iter()
            .enumerate()
            .map(|(i, doc)| (i, similarity(sample, doc, metric)))
            .collect();
        ranked.sort_by(|(a, sa), (b, sb)| {
            sb.total_cmp(sa)
                .then_with(|| {
                    documents[*a]
                        .path()
                        .as_os_str()
                        .cmp(documents[*b].path().as_os_str())
                })
        });
        ranked
    }
}
