//! TF-IDF ranking with an optional LRU term-frequency cache
//!
//! Score per span for query tokens Q:
//!
//! ```text
//! score = ( Σ_{t∈Q} tf(span, t) · idf(t) ) / sqrt(len(span))
//! tf    = 1 + ln(count)        (0 when the token is absent)
//! idf   = ln(N / (1 + df(t)))
//! ```
//!
//! The accumulation order is fixed: TF·IDF summed over the query token
//! sequence, one division by the square root of the document length, then
//! the phrase boost. Reordering changes low bits of the IEEE-754 result and
//! breaks bitwise reproducibility.
//!
//! The TF cache stores per-span token counts keyed by span id, MRU-first,
//! evicting the least recently used entry on overflow. It is process-local
//! and never persisted.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

use crate::search::lexical::LexicalIndex;
use crate::search::types::{SearchResult, PHRASE_BOOST_CAP};
use crate::text::tokenize;

/// Default capacity of the TF cache.
pub const DEFAULT_TF_CACHE_SIZE: usize = 100;

/// Term statistics for one span: raw token counts and token count total.
#[derive(Debug)]
struct TermStats {
    counts: HashMap<String, usize>,
    doc_length: usize,
}

impl TermStats {
    fn compute(text: &str) -> Self {
        let tokens = tokenize(text);
        let doc_length = tokens.len();
        let mut counts = HashMap::new();
        for token in tokens {
            *counts.entry(token).or_insert(0usize) += 1;
        }
        Self { counts, doc_length }
    }
}

/// TF-IDF ranker over a lexical index.
pub struct TfIdfRanker {
    index: Arc<LexicalIndex>,
    by_id: HashMap<String, usize>,
    cache: Mutex<Option<LruCache<String, Arc<TermStats>>>>,
}

impl TfIdfRanker {
    pub fn new(index: Arc<LexicalIndex>) -> Self {
        let by_id = index
            .spans()
            .iter()
            .enumerate()
            .map(|(position, span)| (span.id.clone(), position))
            .collect();
        Self {
            index,
            by_id,
            cache: Mutex::new(None),
        }
    }

    /// Install the TF cache with the given capacity.
    ///
    /// Capacity is fixed at first enable; enabling again is a no-op, so
    /// entries are never duplicated and the cache is never resized.
    pub fn enable_cache(&self, capacity: usize) {
        let mut cache = self.cache.lock();
        if cache.is_none() {
            let capacity = NonZeroUsize::new(capacity.max(1)).expect("tf cache size");
            *cache = Some(LruCache::new(capacity));
            tracing::debug!(capacity, "tf cache enabled");
        }
    }

    /// `(entries, capacity)` of the TF cache, when enabled.
    pub fn cache_stats(&self) -> Option<(usize, usize)> {
        let cache = self.cache.lock();
        cache.as_ref().map(|c| (c.len(), c.cap().get()))
    }

    /// Score each result in place and return the list in its input order.
    ///
    /// `phrase_boost` is the increment per distinct matched phrase; the total
    /// boost is capped at 0.3. Sorting is the caller's responsibility.
    pub fn rank_with_hits(
        &self,
        mut results: Vec<SearchResult>,
        query_tokens: &[String],
        phrase_boost: f64,
    ) -> Vec<SearchResult> {
        let total = self.index.total_documents() as f64;

        for result in &mut results {
            let Some(&position) = self.by_id.get(&result.span_id) else {
                continue;
            };
            let stats = self.term_stats(&result.span_id, position);

            let mut score = 0.0;
            for token in query_tokens {
                let count = stats.counts.get(token).copied().unwrap_or(0);
                if count == 0 {
                    continue;
                }
                let tf = 1.0 + (count as f64).ln();
                let idf = (total / (1.0 + self.index.document_frequency(token) as f64)).ln();
                score += tf * idf;
            }
            if stats.doc_length > 0 {
                score /= (stats.doc_length as f64).sqrt();
            }

            let matched = result.hits.matched_phrase_count() as f64;
            score += (matched * phrase_boost).min(PHRASE_BOOST_CAP);

            result.score = score;
        }

        results
    }

    fn term_stats(&self, span_id: &str, position: usize) -> Arc<TermStats> {
        {
            let mut cache = self.cache.lock();
            if let Some(cache) = cache.as_mut() {
                if let Some(stats) = cache.get(span_id) {
                    return Arc::clone(stats);
                }
            }
        }

        let stats = Arc::new(TermStats::compute(&self.index.spans()[position].text));

        let mut cache = self.cache.lock();
        if let Some(cache) = cache.as_mut() {
            cache.put(span_id.to_string(), Arc::clone(&stats));
        }
        stats
    }
}
