//! Inverted lexical index
//!
//! Token → span-posting map built once from the full span list. Queries are
//! AND intersections over effective posting sets; a token's effective set is
//! its exact posting, optionally widened by the postings of its one-edit
//! vocabulary neighbors when fuzzy matching is enabled and the token is
//! eligible. Quoted phrases are verified against candidate span texts after
//! intersection.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use crate::artifact::Span;
use crate::text::{
    contains_all_phrases, find_phrase_matches, fuzzy_candidates, normalize_phrase, parse_query,
    tokenize,
};
use crate::search::types::{FuzzyOptions, HitAnnotations, PhraseHit, SearchResult, TokenHit};

/// Inverted index over a fixed span list.
pub struct LexicalIndex {
    spans: Arc<Vec<Span>>,
    /// Token to the set of span positions containing it.
    postings: HashMap<String, BTreeSet<usize>>,
    /// Key set of `postings`, for fuzzy-neighborhood intersection.
    vocabulary: HashSet<String>,
}

impl LexicalIndex {
    /// Build the index with a single pass over the spans.
    pub fn build(spans: Arc<Vec<Span>>) -> Self {
        let mut postings: HashMap<String, BTreeSet<usize>> = HashMap::new();
        for (position, span) in spans.iter().enumerate() {
            for token in tokenize(&span.text) {
                postings.entry(token).or_default().insert(position);
            }
        }
        let vocabulary = postings.keys().cloned().collect();

        tracing::debug!(
            spans = spans.len(),
            vocabulary = postings.len(),
            "lexical index built"
        );

        Self {
            spans,
            postings,
            vocabulary,
        }
    }

    /// Number of spans containing `token`; 0 when the token is unknown.
    pub fn document_frequency(&self, token: &str) -> usize {
        self.postings.get(token).map_or(0, BTreeSet::len)
    }

    /// Total span count.
    pub fn total_documents(&self) -> usize {
        self.spans.len()
    }

    /// The corpus vocabulary.
    pub fn vocabulary(&self) -> &HashSet<String> {
        &self.vocabulary
    }

    /// The indexed spans, in index position order.
    pub fn spans(&self) -> &Arc<Vec<Span>> {
        &self.spans
    }

    /// Plain AND search: tokenize, intersect postings, return span ids.
    ///
    /// Result order from this primitive is unspecified (ascending index
    /// position in practice); callers re-order.
    pub fn search(&self, query: &str, limit: Option<usize>) -> Vec<String> {
        let tokens = tokenize(query);
        if tokens.is_empty() {
            return Vec::new();
        }

        let mut sets: Vec<&BTreeSet<usize>> = Vec::with_capacity(tokens.len());
        for token in &tokens {
            match self.postings.get(token) {
                Some(posting) => sets.push(posting),
                None => return Vec::new(),
            }
        }

        let candidates = intersect_refs(&sets);
        let ids = candidates.iter().map(|&i| self.spans[i].id.clone());
        match limit {
            Some(limit) => ids.take(limit).collect(),
            None => ids.collect(),
        }
    }

    /// Full search: phrase-aware, optionally fuzzy, with hit annotations.
    ///
    /// Emits one [`SearchResult`] per surviving span with `score = 0.0`.
    /// `limit` is applied at emission time; ranking callers pass `None` so
    /// the ranker sees the complete candidate set.
    pub fn search_with_hits(
        &self,
        query: &str,
        limit: Option<usize>,
        fuzzy: Option<&FuzzyOptions>,
    ) -> Vec<SearchResult> {
        let parsed = parse_query(query);
        if parsed.tokens.is_empty() && parsed.phrases.is_empty() {
            return Vec::new();
        }

        let candidates = if parsed.tokens.is_empty() {
            self.phrase_seed_candidates(&parsed.phrases)
        } else {
            let effective: Vec<BTreeSet<usize>> = parsed
                .tokens
                .iter()
                .map(|token| self.effective_posting(token, fuzzy))
                .collect();
            let refs: Vec<&BTreeSet<usize>> = effective.iter().collect();
            intersect_refs(&refs)
        };

        let mut results = Vec::new();
        for position in candidates {
            let span = &self.spans[position];
            if !contains_all_phrases(&span.text, &parsed.phrases) {
                continue;
            }

            let tokens = parsed
                .tokens
                .iter()
                .map(|token| TokenHit {
                    token: token.clone(),
                    fuzzy: self
                        .postings
                        .get(token)
                        .map_or(true, |posting| !posting.contains(&position)),
                })
                .collect();
            let phrases = parsed
                .phrases
                .iter()
                .map(|phrase| PhraseHit {
                    phrase: normalize_phrase(phrase),
                    ranges: find_phrase_matches(&span.text, phrase),
                })
                .collect();

            results.push(SearchResult {
                span_id: span.id.clone(),
                order: span.order,
                score: 0.0,
                hits: HitAnnotations { tokens, phrases },
            });
            if let Some(limit) = limit {
                if results.len() >= limit {
                    break;
                }
            }
        }

        tracing::trace!(
            query,
            candidates = results.len(),
            fuzzy = fuzzy.is_some(),
            "lexical search"
        );
        results
    }

    /// Exact posting widened by eligible fuzzy neighbors.
    fn effective_posting(&self, token: &str, fuzzy: Option<&FuzzyOptions>) -> BTreeSet<usize> {
        let mut effective = self
            .postings
            .get(token)
            .cloned()
            .unwrap_or_default();

        let Some(options) = fuzzy else {
            return effective;
        };
        if options.max_edits != 1
            || token.len() < options.min_token_len
            || self.document_frequency(token) >= options.df_threshold
        {
            return effective;
        }

        for candidate in
            fuzzy_candidates(token, &self.vocabulary, options.max_candidates_per_token)
        {
            if let Some(posting) = self.postings.get(&candidate) {
                effective.extend(posting.iter().copied());
            }
        }
        effective
    }

    /// Candidate prefilter for phrase-only queries: the posting of the first
    /// word of the first phrase.
    fn phrase_seed_candidates(&self, phrases: &[String]) -> BTreeSet<usize> {
        let first_word = phrases
            .first()
            .map(|phrase| tokenize(phrase))
            .and_then(|words| words.into_iter().next());
        match first_word {
            Some(word) => self.postings.get(&word).cloned().unwrap_or_default(),
            None => BTreeSet::new(),
        }
    }
}

/// Intersection of posting sets, smallest set first.
fn intersect_refs(sets: &[&BTreeSet<usize>]) -> BTreeSet<usize> {
    let Some(smallest) = sets.iter().min_by_key(|s| s.len()) else {
        return BTreeSet::new();
    };
    smallest
        .iter()
        .copied()
        .filter(|position| sets.iter().all(|s| s.contains(position)))
        .collect()
}
