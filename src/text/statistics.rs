//! Per-document term statistics.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::tokenizer::{ChunkSink, TokenSink, Tokenizer};
use super::TextRules;

/// Term counts for one document.
///
/// Counts live in an ordered map. Every reduction over terms (norms, dot
/// products, signatures) walks them in the same order, so results are
/// reproducible bit for bit.
#[derive(Clone)]
pub struct DocumentStatistics {
    counts: BTreeMap<String, u64>,
    total: u64,
    rules: Arc<TextRules>,
}

impl DocumentStatistics {
    /// Creates empty statistics using the process-wide [`TextRules`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_rules(TextRules::shared())
    }

    /// Creates empty statistics with explicit rules.
    #[must_use]
    pub fn with_rules(rules: Arc<TextRules>) -> Self {
        Self {
            counts: BTreeMap::new(),
            total: 0,
            rules,
        }
    }

    /// Tokenizes a complete string in one chunk.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let mut stats = Self::new();
        stats.add_text(text);
        stats
    }

    /// Tokenizes `text` into these statistics.
    pub fn add_text(&mut self, text: &str) {
        let mut tokenizer = self.tokenizer();
        tokenizer.add_chunk(text.as_bytes());
        tokenizer.finish();
    }

    /// A tokenizer that feeds these statistics with their own folding rule.
    pub fn tokenizer(&mut self) -> Tokenizer<'_, Self> {
        let folding = self.rules.folding;
        Tokenizer::new(self, folding)
    }

    /// Counts `token` unless it is empty or a stop word.
    pub fn add_token(&mut self, token: &str) {
        if token.is_empty() || self.rules.is_stop_word(token) {
            return;
        }
        match self.counts.get_mut(token) {
            Some(count) => *count += 1,
            None => {
                self.counts.insert(token.to_string(), 1);
            }
        }
        self.total += 1;
    }

    /// Resets to empty, keeping the rules.
    pub fn clear(&mut self) {
        self.counts.clear();
        self.total = 0;
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Total number of counted tokens.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Occurrences of `term`, 0 if absent.
    #[must_use]
    pub fn count(&self, term: &str) -> u64 {
        self.counts.get(term).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn distinct_terms(&self) -> usize {
        self.counts.len()
    }

    /// `(term, count)` pairs in term order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.counts.iter().map(|(term, count)| (term.as_str(), *count))
    }

    pub(crate) fn counts(&self) -> &BTreeMap<String, u64> {
        &self.counts
    }
}

impl Default for DocumentStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenSink for DocumentStatistics {
    fn add_token(&mut self, token: &str) {
        DocumentStatistics::add_token(self, token);
    }
}

impl fmt::Debug for DocumentStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentStatistics")
            .field("total", &self.total)
            .field("distinct_terms", &self.counts.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::{CaseFolding, StopWords};

    #[test]
    fn test_from_text_filters_stop_words() {
        let stats = DocumentStatistics::from_text("The cat sat on the mat");
        assert_eq!(stats.total(), 3);
        assert_eq!(stats.count("cat"), 1);
        assert_eq!(stats.count("the"), 0);
        assert_eq!(stats.count("on"), 0);
    }

    #[test]
    fn test_total_matches_sum_of_counts() {
        let stats = DocumentStatistics::from_text("alpha beta alpha gamma alpha beta");
        let sum: u64 = stats.iter().map(|(_, count)| count).sum();
        assert_eq!(stats.total(), sum);
        assert_eq!(stats.total(), 6);
        assert_eq!(stats.count("alpha"), 3);
        assert_eq!(stats.distinct_terms(), 3);
    }

    #[test]
    fn test_iter_is_term_ordered() {
        let stats = DocumentStatistics::from_text("zebra apple mango apple");
        let terms: Vec<&str> = stats.iter().map(|(term, _)| term).collect();
        assert_eq!(terms, vec!["apple", "mango", "zebra"]);
    }

    #[test]
    fn test_empty_and_clear() {
        let mut stats = DocumentStatistics::from_text("the and of");
        assert!(stats.is_empty());

        stats.add_text("words remain");
        assert!(!stats.is_empty());

        stats.clear();
        assert!(stats.is_empty());
        assert_eq!(stats.distinct_terms(), 0);
        assert_eq!(stats.count("words"), 0);
    }

    #[test]
    fn test_add_token_ignores_empty() {
        let mut stats = DocumentStatistics::new();
        stats.add_token("");
        assert!(stats.is_empty());
    }

    #[test]
    fn test_explicit_rules_without_stop_words() {
        let rules = Arc::new(TextRules {
            folding: CaseFolding::Ascii,
            stop_words: StopWords::none(),
        });
        let mut stats = DocumentStatistics::with_rules(rules);
        stats.add_text("The THE the");
        assert_eq!(stats.count("the"), 3);
    }
}
