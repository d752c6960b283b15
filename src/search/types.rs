//! Shared types for the search module
//!
//! Defines the result and option structures used by the lexical index and
//! the TF-IDF and hybrid rankers.

use serde::Serialize;

use crate::embed::EmbedError;

/// Default phrase boost increment per distinct matched phrase.
pub const DEFAULT_PHRASE_BOOST: f64 = 0.1;
/// Phrase boost never exceeds this cap.
pub const PHRASE_BOOST_CAP: f64 = 0.3;

/// Errors from search and ranking operations.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Dimension(#[from] EmbedError),
}

/// Ranking strategy for a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RankMode {
    /// Results in ascending document order, scores left at zero.
    #[default]
    None,
    /// TF-IDF with phrase boost.
    Tfidf,
    /// Weighted fusion of TF-IDF and embedding cosine.
    Hybrid,
}

/// Fuzzy matching options for query tokens.
///
/// Only `max_edits == 1` enables fuzzy matching; any other value disables it
/// for every token. A token is expanded only when it is long enough and rare
/// enough, so common short words never fan out. Phrases are never fuzzified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzyOptions {
    /// Maximum edit distance. Only 1 is supported.
    pub max_edits: u32,
    /// Minimum token length for fuzzy eligibility.
    pub min_token_len: usize,
    /// Tokens with document frequency at or above this stay exact-only.
    pub df_threshold: usize,
    /// Cap on vocabulary candidates per query token.
    pub max_candidates_per_token: usize,
}

impl Default for FuzzyOptions {
    fn default() -> Self {
        Self {
            max_edits: 1,
            min_token_len: 4,
            df_threshold: 5,
            max_candidates_per_token: 50,
        }
    }
}

/// Options for the hybrid ranker.
#[derive(Debug, Clone, PartialEq)]
pub struct HybridOptions {
    /// Weight of the TF-IDF signal, in `[0, 1]`.
    pub weight_lexical: f64,
    /// Weight of the embedding cosine signal, in `[0, 1]`.
    pub weight_semantic: f64,
    /// Min–max normalize both score maps before fusion.
    pub normalize: bool,
}

impl Default for HybridOptions {
    fn default() -> Self {
        Self {
            weight_lexical: 0.7,
            weight_semantic: 0.3,
            normalize: true,
        }
    }
}

impl HybridOptions {
    /// Reject negative weights and weight sums above 1.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.weight_lexical < 0.0 || self.weight_semantic < 0.0 {
            return Err(SearchError::InvalidArgument(
                "hybrid weights must be non-negative".to_string(),
            ));
        }
        if self.weight_lexical + self.weight_semantic > 1.0 {
            return Err(SearchError::InvalidArgument(format!(
                "hybrid weights sum to {} (> 1)",
                self.weight_lexical + self.weight_semantic
            )));
        }
        Ok(())
    }
}

/// How one query token matched a span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenHit {
    pub token: String,
    /// True when the token matched only through its one-edit expansion.
    pub fuzzy: bool,
}

/// How one query phrase matched a span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhraseHit {
    /// Normalized phrase text.
    pub phrase: String,
    /// Non-overlapping `(start, end)` offsets in the normalized span text.
    pub ranges: Vec<(usize, usize)>,
}

/// Per-span match annotations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HitAnnotations {
    pub tokens: Vec<TokenHit>,
    pub phrases: Vec<PhraseHit>,
}

impl HitAnnotations {
    /// Number of distinct phrases with at least one match.
    pub fn matched_phrase_count(&self) -> usize {
        let mut seen = std::collections::HashSet::new();
        self.phrases
            .iter()
            .filter(|p| !p.ranges.is_empty())
            .filter(|p| seen.insert(p.phrase.as_str()))
            .count()
    }
}

/// One span matching a query, with its annotations and (eventual) score.
///
/// The lexical index emits these with `score == 0.0`; rankers overwrite the
/// score and the reader sorts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub span_id: String,
    pub order: u32,
    pub score: f64,
    pub hits: HitAnnotations,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuzzy_options_defaults() {
        let options = FuzzyOptions::default();
        assert_eq!(options.max_edits, 1);
        assert_eq!(options.min_token_len, 4);
        assert_eq!(options.df_threshold, 5);
        assert_eq!(options.max_candidates_per_token, 50);
    }

    #[test]
    fn test_hybrid_options_defaults_validate() {
        assert!(HybridOptions::default().validate().is_ok());
    }

    #[test]
    fn test_hybrid_options_negative_weight() {
        let options = HybridOptions {
            weight_lexical: -0.1,
            ..HybridOptions::default()
        };
        assert!(matches!(
            options.validate(),
            Err(SearchError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_hybrid_options_sum_above_one() {
        let options = HybridOptions {
            weight_lexical: 0.8,
            weight_semantic: 0.3,
            normalize: true,
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_matched_phrase_count_dedupes() {
        let hits = HitAnnotations {
            tokens: vec![],
            phrases: vec![
                PhraseHit {
                    phrase: "a b".to_string(),
                    ranges: vec![(0, 3)],
                },
                PhraseHit {
                    phrase: "a b".to_string(),
                    ranges: vec![(4, 7)],
                },
                PhraseHit {
                    phrase: "c d".to_string(),
                    ranges: vec![],
                },
            ],
        };
        assert_eq!(hits.matched_phrase_count(), 1);
    }
}
