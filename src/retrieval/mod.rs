//! Retrieval packs: merged, deduplicated, budgeted context windows
//!
//! Each search hit is expanded to its neighboring spans or to its full
//! section, expansions landing on the same window are merged (best-scoring
//! entry wins, paragraph sets union in document order), packs are ordered by
//! entry score, and finally a pack-count limit and an optional hard
//! character budget are applied greedily in order.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::reader::{Reader, SearchOptions};
use crate::search::{HitAnnotations, RankMode, SearchError};

/// Options for [`Reader::retrieve`].
#[derive(Debug, Clone)]
pub struct RetrieveOptions {
    /// Maximum number of packs returned.
    pub limit: usize,
    /// Spans taken on each side of a hit in neighbors mode.
    pub per_hit_neighbors: usize,
    pub expand: ExpandMode,
    /// Hard character cap across all returned packs.
    pub max_tokens: Option<usize>,
    pub rank: RankMode,
}

impl Default for RetrieveOptions {
    fn default() -> Self {
        Self {
            limit: 5,
            per_hit_neighbors: 1,
            expand: ExpandMode::Neighbors,
            max_tokens: None,
            rank: RankMode::Tfidf,
        }
    }
}

/// How a hit is widened into a pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpandMode {
    /// A window of `per_hit_neighbors` spans on each side of the hit.
    Neighbors,
    /// The hit's full parent section; falls back to neighbors when no
    /// section is resolvable.
    Section,
}

/// Inclusive span-order range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRange {
    pub start: u32,
    pub end: u32,
}

/// Provenance of a pack's window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PackScope {
    #[serde(rename_all = "camelCase")]
    Neighbors { range: OrderRange },
    #[serde(rename_all = "camelCase")]
    Section { section_id: String },
}

/// The hit a pack was built around.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalPackEntry {
    pub span_id: String,
    pub order: u32,
    pub score: f64,
    pub heading_path: Vec<String>,
    pub hits: HitAnnotations,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackMeta {
    pub heading_path: Vec<String>,
    pub span_count: usize,
    pub char_count: usize,
}

/// One merged context block ready for prompting.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalPack {
    /// `o:<start>-<end>` for neighbor windows, `s:<sectionId>` for sections.
    pub pack_id: String,
    /// Best entry among the hits merged into this pack.
    pub entry: RetrievalPackEntry,
    pub scope: PackScope,
    /// Member span ids in document order, no duplicates.
    pub paragraph_ids: Vec<String>,
    /// Member texts joined with blank lines.
    pub text: String,
    pub meta: PackMeta,
}

struct Expansion {
    pack_id: String,
    entry: RetrievalPackEntry,
    scope: PackScope,
    paragraph_ids: Vec<String>,
    heading_path: Vec<String>,
}

/// Build retrieval packs for a query. See module docs for the pipeline.
pub(crate) fn build_packs(
    reader: &Reader,
    query: &str,
    options: &RetrieveOptions,
) -> Result<Vec<RetrievalPack>, SearchError> {
    // Oversample so merging and budgeting still leave `limit` good packs.
    let search_options = SearchOptions {
        rank: options.rank,
        limit: Some(options.limit * 4),
        ..SearchOptions::default()
    };
    let results = reader.search(query, &search_options)?;

    let mut expansions = Vec::with_capacity(results.len());
    for result in results {
        let Some(span) = reader.get_span(&result.span_id) else {
            continue;
        };
        let entry = RetrievalPackEntry {
            span_id: result.span_id.clone(),
            order: result.order,
            score: result.score,
            heading_path: span.heading_path.clone(),
            hits: result.hits,
        };
        let expansion = match options.expand {
            ExpandMode::Section => expand_section(reader, &entry)
                .unwrap_or_else(|| expand_neighbors(reader, &entry, options.per_hit_neighbors)),
            ExpandMode::Neighbors => {
                expand_neighbors(reader, &entry, options.per_hit_neighbors)
            }
        };
        expansions.push(expansion);
    }

    let mut packs = merge_expansions(reader, expansions);
    packs.sort_by(|a, b| {
        b.entry
            .score
            .partial_cmp(&a.entry.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.entry.order.cmp(&b.entry.order))
    });

    packs.truncate(options.limit);
    if let Some(max_tokens) = options.max_tokens {
        let mut running = 0usize;
        let mut kept = 0usize;
        for pack in &packs {
            if running + pack.meta.char_count > max_tokens {
                break;
            }
            running += pack.meta.char_count;
            kept += 1;
        }
        packs.truncate(kept);
    }

    tracing::debug!(query, packs = packs.len(), "retrieval packs built");
    Ok(packs)
}

fn expand_neighbors(reader: &Reader, entry: &RetrievalPackEntry, per_hit: usize) -> Expansion {
    let order = entry.order as usize;
    let last = reader.get_span_count().saturating_sub(1);
    let start = order.saturating_sub(per_hit);
    let end = (order + per_hit).min(last);

    let paragraph_ids = (start..=end)
        .filter_map(|o| reader.get_by_order(o as u32))
        .map(|span| span.id.clone())
        .collect();

    Expansion {
        pack_id: format!("o:{start}-{end}"),
        entry: entry.clone(),
        scope: PackScope::Neighbors {
            range: OrderRange {
                start: start as u32,
                end: end as u32,
            },
        },
        paragraph_ids,
        heading_path: entry.heading_path.clone(),
    }
}

fn expand_section(reader: &Reader, entry: &RetrievalPackEntry) -> Option<Expansion> {
    let map = reader.get_node_map()?;
    let section_id = map.section_of(&entry.span_id)?.to_string();
    let section = map.sections.get(&section_id)?;

    Some(Expansion {
        pack_id: format!("s:{section_id}"),
        entry: entry.clone(),
        scope: PackScope::Section {
            section_id: section_id.clone(),
        },
        paragraph_ids: section.paragraph_ids.clone(),
        heading_path: section_heading_path(&section.heading),
    })
}

/// Real sections keep their heading text with the markdown hashes stripped;
/// synthetic sections (no leading `#`) get an empty path.
fn section_heading_path(heading: &str) -> Vec<String> {
    if !heading.starts_with('#') {
        return Vec::new();
    }
    let stripped = heading.trim_start_matches('#').trim_start();
    vec![stripped.to_string()]
}

/// Group expansions by pack id: best entry wins (higher score, then lower
/// order), paragraph sets union in document order.
fn merge_expansions(reader: &Reader, expansions: Vec<Expansion>) -> Vec<RetrievalPack> {
    let mut merged: HashMap<String, Expansion> = HashMap::new();
    for expansion in expansions {
        match merged.entry(expansion.pack_id.clone()) {
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(expansion);
            }
            std::collections::hash_map::Entry::Occupied(mut slot) => {
                let kept = slot.get_mut();
                kept.paragraph_ids.extend(expansion.paragraph_ids);
                let better = expansion.entry.score > kept.entry.score
                    || (expansion.entry.score == kept.entry.score
                        && expansion.entry.order < kept.entry.order);
                if better {
                    kept.entry = expansion.entry;
                    kept.scope = expansion.scope;
                    kept.heading_path = expansion.heading_path;
                }
            }
        }
    }

    merged
        .into_values()
        .map(|expansion| materialize(reader, expansion))
        .collect()
}

fn materialize(reader: &Reader, expansion: Expansion) -> RetrievalPack {
    // Union member ids through their orders for document order without dupes.
    let orders: BTreeSet<u32> = expansion
        .paragraph_ids
        .iter()
        .filter_map(|id| reader.get_span(id))
        .map(|span| span.order)
        .collect();
    let paragraph_ids: Vec<String> = orders
        .iter()
        .filter_map(|&o| reader.get_by_order(o))
        .map(|span| span.id.clone())
        .collect();

    let texts: Vec<&str> = orders
        .iter()
        .filter_map(|&o| reader.get_by_order(o))
        .map(|span| span.text.as_str())
        .collect();
    let text = texts.join("\n\n");
    let char_count = text.chars().count();

    RetrievalPack {
        pack_id: expansion.pack_id,
        entry: expansion.entry,
        scope: expansion.scope,
        meta: PackMeta {
            heading_path: expansion.heading_path,
            span_count: paragraph_ids.len(),
            char_count,
        },
        paragraph_ids,
        text,
    }
}
