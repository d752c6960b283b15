//! Hybrid ranking: weighted fusion of TF-IDF and embedding cosine
//!
//! The lexical and semantic score maps are min–max normalized independently
//! (a degenerate map where max equals min normalizes to all-ones) and fused
//! as `lexical · w_l + semantic · w_s`. Spans without a persisted embedding
//! are skipped for the semantic signal with one warning per span per ranker;
//! their missing value fuses as 0.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::embed::cosine_similarity;
use crate::search::lexical::LexicalIndex;
use crate::search::tfidf::TfIdfRanker;
use crate::search::types::{HybridOptions, SearchError, SearchResult, DEFAULT_PHRASE_BOOST};

/// Fuses TF-IDF scores with embedding cosine similarity.
pub struct HybridRanker {
    index: Arc<LexicalIndex>,
    by_id: HashMap<String, usize>,
    /// Span ids already warned about a missing embedding.
    warned_missing: Mutex<HashSet<String>>,
}

impl HybridRanker {
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
            warned_missing: Mutex::new(HashSet::new()),
        }
    }

    /// Score each result with the fused signal; sorting is deferred to the
    /// caller. Fails on negative weights or a weight sum above 1.
    pub fn rank(
        &self,
        tfidf: &TfIdfRanker,
        results: Vec<SearchResult>,
        query_tokens: &[String],
        query_embedding: &[f64],
        options: &HybridOptions,
    ) -> Result<Vec<SearchResult>, SearchError> {
        options.validate()?;
        if results.is_empty() {
            return Ok(results);
        }

        let mut results = tfidf.rank_with_hits(results, query_tokens, DEFAULT_PHRASE_BOOST);

        let mut lexical: Vec<f64> = results.iter().map(|r| r.score).collect();
        let mut semantic: Vec<Option<f64>> = Vec::with_capacity(results.len());
        for result in &results {
            semantic.push(self.semantic_score(&result.span_id, query_embedding)?);
        }

        if options.normalize {
            min_max_normalize(&mut lexical);
            min_max_normalize_sparse(&mut semantic);
        }

        for (i, result) in results.iter_mut().enumerate() {
            let lexical_part = lexical[i] * options.weight_lexical;
            let semantic_part = semantic[i].unwrap_or(0.0) * options.weight_semantic;
            result.score = lexical_part + semantic_part;
        }
        Ok(results)
    }

    fn semantic_score(
        &self,
        span_id: &str,
        query_embedding: &[f64],
    ) -> Result<Option<f64>, SearchError> {
        let Some(&position) = self.by_id.get(span_id) else {
            return Ok(None);
        };
        match &self.index.spans()[position].embedding {
            Some(embedding) => Ok(Some(cosine_similarity(query_embedding, embedding)?)),
            None => {
                if self.warned_missing.lock().insert(span_id.to_string()) {
                    tracing::warn!(span_id, "span has no embedding; semantic score skipped");
                }
                Ok(None)
            }
        }
    }
}

/// In-place min–max normalization; a constant map becomes all 1.0.
fn min_max_normalize(values: &mut [f64]) {
    let Some(&first) = values.first() else {
        return;
    };
    let (min, max) = values
        .iter()
        .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    for value in values.iter_mut() {
        *value = if max == min {
            1.0
        } else {
            (*value - min) / (max - min)
        };
    }
}

/// Min–max normalization over the present entries only.
fn min_max_normalize_sparse(values: &mut [Option<f64>]) {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    let Some(&first) = present.first() else {
        return;
    };
    let (min, max) = present
        .iter()
        .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    for value in values.iter_mut() {
        if let Some(v) = value {
            *v = if max == min { 1.0 } else { (*v - min) / (max - min) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::Span;
    use crate::embed::embed_text;

    fn span(order: u32, text: &str, embedded: bool) -> Span {
        Span {
            id: format!("span:{:06}", order + 1),
            text: text.to_string(),
            order,
            heading_path: vec![],
            embedding: embedded.then(|| embed_text(text)),
        }
    }

    fn setup(texts: &[(&str, bool)]) -> (Arc<LexicalIndex>, TfIdfRanker, HybridRanker) {
        let spans: Vec<Span> = texts
            .iter()
            .enumerate()
            .map(|(i, (text, embedded))| span(i as u32, text, *embedded))
            .collect();
        let index = Arc::new(LexicalIndex::build(Arc::new(spans)));
        let tfidf = TfIdfRanker::new(Arc::clone(&index));
        let hybrid = HybridRanker::new(Arc::clone(&index));
        (index, tfidf, hybrid)
    }

    #[test]
    fn test_rank_rejects_bad_weights() {
        let (_, tfidf, hybrid) = setup(&[("alpha", true)]);
        let options = HybridOptions {
            weight_lexical: 0.9,
            weight_semantic: 0.2,
            normalize: true,
        };
        let err = hybrid.rank(&tfidf, vec![], &[], &embed_text("alpha"), &options);
        assert!(matches!(err, Err(SearchError::InvalidArgument(_))));
    }

    #[test]
    fn test_rank_empty_results() {
        let (_, tfidf, hybrid) = setup(&[("alpha", true)]);
        let out = hybrid
            .rank(&tfidf, vec![], &[], &embed_text("alpha"), &HybridOptions::default())
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_rank_exact_match_wins() {
        let (index, tfidf, hybrid) = setup(&[
            ("alpha beta gamma", true),
            ("alpha unrelated filler words", true),
            ("nothing relevant", true),
            ("padding text", true),
        ]);
        let results = index.search_with_hits("alpha", None, None);
        let tokens = vec!["alpha".to_string()];
        let ranked = hybrid
            .rank(
                &tfidf,
                results,
                &tokens,
                &embed_text("alpha beta gamma"),
                &HybridOptions::default(),
            )
            .unwrap();
        assert_eq!(ranked.len(), 2);
        let best = ranked
            .iter()
            .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap())
            .unwrap();
        assert_eq!(best.span_id, "span:000001");
    }

    #[test]
    fn test_rank_single_result_normalizes_to_weight_sum() {
        let (index, tfidf, hybrid) = setup(&[("alpha beta", true), ("other words", true)]);
        let results = index.search_with_hits("alpha", None, None);
        let tokens = vec!["alpha".to_string()];
        let ranked = hybrid
            .rank(
                &tfidf,
                results,
                &tokens,
                &embed_text("alpha"),
                &HybridOptions::default(),
            )
            .unwrap();
        // One candidate: both maps are degenerate, both normalize to 1.0.
        assert_eq!(ranked.len(), 1);
        assert!((ranked[0].score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rank_missing_embedding_fuses_as_zero() {
        let (index, tfidf, hybrid) = setup(&[("alpha beta", false), ("alpha gamma", true)]);
        let results = index.search_with_hits("alpha", None, None);
        let tokens = vec!["alpha".to_string()];
        let ranked = hybrid
            .rank(
                &tfidf,
                results,
                &tokens,
                &embed_text("alpha gamma"),
                &HybridOptions::default(),
            )
            .unwrap();
        let without = ranked.iter().find(|r| r.span_id == "span:000001").unwrap();
        let with = ranked.iter().find(|r| r.span_id == "span:000002").unwrap();
        // Lexical parts tie after normalization; only span 2 gets semantics.
        assert!(with.score > without.score);
    }

    #[test]
    fn test_rank_without_normalization_uses_raw_scores() {
        let (index, tfidf, hybrid) = setup(&[
            ("alpha beta", true),
            ("alpha gamma delta", true),
            ("unrelated", true),
        ]);
        let results = index.search_with_hits("alpha", None, None);
        let tokens = vec!["alpha".to_string()];
        let options = HybridOptions {
            normalize: false,
            ..HybridOptions::default()
        };
        let ranked = hybrid
            .rank(&tfidf, results, &tokens, &embed_text("alpha"), &options)
            .unwrap();
        assert_eq!(ranked.len(), 2);
        for result in ranked {
            assert!(result.score.is_finite());
        }
    }

    #[test]
    fn test_rank_dimension_mismatch_is_error() {
        let (index, tfidf, hybrid) = setup(&[("alpha", true)]);
        let results = index.search_with_hits("alpha", None, None);
        let err = hybrid.rank(
            &tfidf,
            results,
            &["alpha".to_string()],
            &[0.0; 64],
            &HybridOptions::default(),
        );
        assert!(matches!(err, Err(SearchError::Dimension(_))));
    }
}
