//! Near-duplicate detection module.
//!
//! This module provides functionality for:
//! - Reading version and date markers from file names ([`heuristic`])
//! - Choosing which of two near-duplicates to keep ([`keeper`])
//! - The all-pairs best-match search ([`scoring`])
//! - Report rows and the relocation schedule ([`groups`])
//! - The pipeline that ties them together ([`finder`])

pub mod finder;
pub mod groups;
pub mod heuristic;
pub mod keeper;
pub mod scoring;

pub use finder::{
    default_threads, EngineConfig, EngineError, LoadedCorpus, MatchEngine, MatchReport,
    MatchSummary, SkipReason, SkippedDocument, LOADING_PHASE,
};
pub use groups::{
    build_rows, is_dedup_score, resolve_duplicates, MatchRow, PairIds, OUTPUT_PAIR_THRESHOLD,
};
pub use heuristic::VersionDescriptor;
pub use keeper::{choose_duplicate, duplicate_index, FileRank, Side};
pub use scoring::{
    best_match_table, best_match_table_parallel, BestMatchTable, MatchRecord, SCORING_PHASE,
};
