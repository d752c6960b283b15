//! Reader: the public runtime surface over one loaded corpus
//!
//! Owns the artifacts for its lifetime and wraps them with query structures:
//! an id lookup and order table built at construction, plus the lexical
//! index and rankers built lazily on first use (each once per reader). All
//! query methods take `&self`; the lazily-built state is guarded internally,
//! so a reader can be shared once constructed.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, OnceLock};

use crate::artifact::{BuildReport, Manifest, NodeMap, Span};
use crate::embed::embed_text;
use crate::loader::{load_artifacts, ArtifactError, LoadedArtifacts};
use crate::prompt::{assemble_prompt, AssembledPrompt, PromptRequest};
use crate::retrieval::{build_packs, RetrievalPack, RetrieveOptions};
use crate::search::{
    FuzzyOptions, HybridOptions, HybridRanker, LexicalIndex, RankMode, SearchError, SearchResult,
    TfIdfRanker, DEFAULT_PHRASE_BOOST,
};
use crate::text::parse_query;

/// Options for [`Reader::search`].
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Maximum results, applied after ranking.
    pub limit: Option<usize>,
    pub rank: RankMode,
    /// Fuzzy token matching; `None` keeps matching exact.
    pub fuzzy: Option<FuzzyOptions>,
    /// Fusion weights, used only when `rank` is [`RankMode::Hybrid`].
    pub hybrid: HybridOptions,
}

/// Neighborhood shape for [`Reader::neighbors`].
#[derive(Debug, Clone)]
pub struct NeighborOptions {
    pub before: usize,
    pub after: usize,
}

impl Default for NeighborOptions {
    fn default() -> Self {
        Self { before: 1, after: 1 }
    }
}

/// Load an artifact directory and construct a reader over it.
pub fn create_reader(directory: impl AsRef<Path>) -> Result<Reader, ArtifactError> {
    Ok(Reader::new(load_artifacts(directory)?))
}

/// Deterministic query interface over one immutable corpus.
pub struct Reader {
    manifest: Manifest,
    node_map: Option<NodeMap>,
    build_report: Option<BuildReport>,
    /// Spans sorted by `order`.
    spans: Arc<Vec<Span>>,
    spans_by_id: HashMap<String, usize>,
    /// Section id to its paragraph ids, present only with a node map.
    section_index: BTreeMap<String, Vec<String>>,
    lexical: OnceLock<Arc<LexicalIndex>>,
    tfidf: OnceLock<TfIdfRanker>,
    hybrid: OnceLock<HybridRanker>,
}

impl Reader {
    /// Wrap a loaded artifact set. Spans are re-sorted by `order` so lookup
    /// tables are position-addressable regardless of file order.
    pub fn new(artifacts: LoadedArtifacts) -> Self {
        let LoadedArtifacts {
            manifest,
            mut spans,
            node_map,
            build_report,
        } = artifacts;

        spans.sort_by_key(|span| span.order);
        let spans = Arc::new(spans);
        let spans_by_id = spans
            .iter()
            .enumerate()
            .map(|(position, span)| (span.id.clone(), position))
            .collect();
        let section_index = node_map
            .as_ref()
            .map(|map| {
                map.sections
                    .iter()
                    .map(|(id, section)| (id.clone(), section.paragraph_ids.clone()))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            manifest,
            node_map,
            build_report,
            spans,
            spans_by_id,
            section_index,
            lexical: OnceLock::new(),
            tfidf: OnceLock::new(),
            hybrid: OnceLock::new(),
        }
    }

    pub fn get_manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn get_span(&self, id: &str) -> Option<&Span> {
        self.spans_by_id.get(id).map(|&position| &self.spans[position])
    }

    /// Span at the given document order; absent when out of range.
    pub fn get_by_order(&self, order: u32) -> Option<&Span> {
        self.spans
            .get(order as usize)
            .filter(|span| span.order == order)
    }

    pub fn get_span_count(&self) -> usize {
        self.spans.len()
    }

    pub fn get_node_map(&self) -> Option<&NodeMap> {
        self.node_map.as_ref()
    }

    pub fn get_build_report(&self) -> Option<&BuildReport> {
        self.build_report.as_ref()
    }

    /// Section ids in sorted order; empty without a node map.
    pub fn list_sections(&self) -> Vec<String> {
        self.section_index.keys().cloned().collect()
    }

    /// Paragraph ids of a section, in document order.
    pub fn get_section(&self, section_id: &str) -> Option<&[String]> {
        self.section_index.get(section_id).map(Vec::as_slice)
    }

    /// Ids for orders in `[order - before, order + after]`, clipped to the
    /// corpus, ascending, target included. Empty for an unknown id.
    pub fn neighbors(&self, id: &str, options: &NeighborOptions) -> Vec<String> {
        let Some(span) = self.get_span(id) else {
            return Vec::new();
        };
        let order = span.order as usize;
        let start = order.saturating_sub(options.before);
        let end = (order + options.after).min(self.spans.len() - 1);
        self.spans[start..=end]
            .iter()
            .map(|span| span.id.clone())
            .collect()
    }

    /// Force-build the lexical index and ranker, then enable the TF cache.
    ///
    /// Capacity is fixed at first enable; later calls do not resize.
    pub fn enable_tf_cache(&self, size: usize) {
        self.tfidf_ranker().enable_cache(size);
    }

    /// Search the corpus.
    ///
    /// Without ranking, results come back in ascending document order. With
    /// ranking, scores are written and results are sorted descending, ties
    /// broken by ascending order; the limit applies after ranking so the
    /// ranker always sees the full candidate set.
    pub fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let index = self.lexical_index();
        let limit_for_search = match options.rank {
            RankMode::None => options.limit,
            RankMode::Tfidf | RankMode::Hybrid => None,
        };
        let mut results = index.search_with_hits(query, limit_for_search, options.fuzzy.as_ref());

        match options.rank {
            RankMode::None => {
                results.sort_by_key(|result| result.order);
            }
            RankMode::Tfidf => {
                let tokens = parse_query(query).tokens;
                results = self
                    .tfidf_ranker()
                    .rank_with_hits(results, &tokens, DEFAULT_PHRASE_BOOST);
                sort_ranked(&mut results);
            }
            RankMode::Hybrid => {
                let tokens = parse_query(query).tokens;
                let query_embedding = embed_text(query);
                results = self.hybrid_ranker().rank(
                    self.tfidf_ranker(),
                    results,
                    &tokens,
                    &query_embedding,
                    &options.hybrid,
                )?;
                sort_ranked(&mut results);
            }
        }

        if let Some(limit) = options.limit {
            results.truncate(limit);
        }
        Ok(results)
    }

    /// Expand search hits into merged, deduplicated, budgeted context packs.
    pub fn retrieve(
        &self,
        query: &str,
        options: &RetrieveOptions,
    ) -> Result<Vec<RetrievalPack>, SearchError> {
        build_packs(self, query, options)
    }

    /// Format packs into a prompt with numeric citation markers. The
    /// reader's manifest id is injected as the document id.
    pub fn assemble_prompt(&self, request: &PromptRequest) -> AssembledPrompt {
        assemble_prompt(request, &self.manifest.id)
    }

    pub(crate) fn lexical_index(&self) -> &Arc<LexicalIndex> {
        self.lexical
            .get_or_init(|| Arc::new(LexicalIndex::build(Arc::clone(&self.spans))))
    }

    fn tfidf_ranker(&self) -> &TfIdfRanker {
        self.tfidf
            .get_or_init(|| TfIdfRanker::new(Arc::clone(self.lexical_index())))
    }

    fn hybrid_ranker(&self) -> &HybridRanker {
        self.hybrid
            .get_or_init(|| HybridRanker::new(Arc::clone(self.lexical_index())))
    }
}

/// Descending score, ties broken by ascending document order.
fn sort_ranked(results: &mut [SearchResult]) {
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.order.cmp(&b.order))
    });
}
