//! Text layer: tokenization and per-document term statistics.
//!
//! This module provides functionality for:
//! - Streaming, chunk-safe UTF-8 tokenization
//! - Case folding and stop-word filtering
//! - Per-document term counts ([`DocumentStatistics`])
//!
//! # Architecture
//!
//! - [`tokenizer`]: byte chunks in, normalized tokens out
//! - [`statistics`]: the token sink that accumulates counts
//! - [`stopwords`]: the built-in multilingual stop-word list
//!
//! The folding rule and stop words are bundled into [`TextRules`]. One set of
//! rules is installed per process (see [`TextRules::install`]); documents built
//! without explicit rules share it.
//!
//! # Example
//!
//! ```
//! use mostsimilar::text::DocumentStatistics;
//!
//! let stats = DocumentStatistics::from_text("The cat sat on the mat.");
//! assert_eq!(stats.total(), 3);
//! assert_eq!(stats.count("cat"), 1);
//! assert_eq!(stats.count("the"), 0);
//! ```

pub mod statistics;
pub mod stopwords;
pub mod tokenizer;

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

pub use statistics::DocumentStatistics;
pub use stopwords::StopWords;
pub use tokenizer::{ChunkSink, TokenSink, Tokenizer};

/// How codepoints are classified and lowercased during tokenization.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum CaseFolding {
    /// Full Unicode classification and lowercase mapping.
    #[default]
    Unicode,
    /// Unicode rules inside the Basic Multilingual Plane; anything above
    /// U+FFFF is appended unfolded and never splits a token.
    UnicodeBmp,
    /// ASCII-only classification and folding; other codepoints are kept as is.
    Ascii,
}

impl CaseFolding {
    /// Returns `true` if `c` ends the current token.
    #[must_use]
    pub fn is_boundary(self, c: char) -> bool {
        match self {
            Self::Unicode => !c.is_alphanumeric(),
            Self::UnicodeBmp => (c as u32) <= 0xFFFF && !c.is_alphanumeric(),
            Self::Ascii => c.is_ascii() && !c.is_ascii_alphanumeric(),
        }
    }

    /// Appends the folded form of a word character to `out`.
    pub fn push_folded(self, c: char, out: &mut String) {
        match self {
            Self::Unicode => out.extend(c.to_lowercase()),
            Self::UnicodeBmp if (c as u32) <= 0xFFFF => out.extend(c.to_lowercase()),
            Self::UnicodeBmp => out.push(c),
            Self::Ascii => out.push(c.to_ascii_lowercase()),
        }
    }
}

/// Tokenization rules shared by every document in a run.
#[derive(Debug, Clone, Default)]
pub struct TextRules {
    /// Codepoint classification and folding.
    pub folding: CaseFolding,
    /// Terms dropped before counting.
    pub stop_words: StopWords,
}

static INSTALLED_RULES: OnceLock<Arc<TextRules>> = OnceLock::new();

impl TextRules {
    /// Builds rules from the built-in stop words plus `extra_stop_words`.
    ///
    /// Extra words are folded with `folding` so they match tokenizer output.
    #[must_use]
    pub fn new<I, S>(folding: CaseFolding, extra_stop_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extra: HashSet<String> = extra_stop_words
            .into_iter()
            .map(|word| {
                let mut folded = String::new();
                for c in word.as_ref().chars() {
                    folding.push_folded(c, &mut folded);
                }
                folded
            })
            .filter(|word| !word.is_empty())
            .collect();

        Self {
            folding,
            stop_words: StopWords::builtin().extended(extra),
        }
    }

    /// Installs the process-wide rules.
    ///
    /// Only the first call takes effect. Returns the rules back if another
    /// set was already installed.
    pub fn install(rules: TextRules) -> Result<(), TextRules> {
        let shared = Arc::new(rules);
        INSTALLED_RULES.set(shared).map_err(|rejected| {
            Arc::try_unwrap(rejected).unwrap_or_else(|arc| (*arc).clone())
        })
    }

    /// The installed rules, or the defaults if none were installed.
    #[must_use]
    pub fn shared() -> Arc<TextRules> {
        Arc::clone(INSTALLED_RULES.get_or_init(|| Arc::new(TextRules::default())))
    }

    /// Returns `true` if `term` is filtered out before counting.
    #[must_use]
    pub fn is_stop_word(&self, term: &str) -> bool {
        self.stop_words.contains(term)
    }
}
