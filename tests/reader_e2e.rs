//! End-to-end scenarios over a compiled nine-span Markdown corpus.

use std::collections::BTreeSet;
use std::path::PathBuf;

use spanbook::{
    compile_to_dir, cosine_similarity, create_reader, embed_text, tokenize, CompileOptions,
    ExpandMode, FuzzyOptions, NeighborOptions, PackScope, PromptRequest, RankMode, Reader,
    RetrieveOptions, SearchOptions,
};

const SAMPLE_MD: &str = "\
# Sample Markdown Document

An introductory paragraph with **bold** text.

## Section Two

Here's the second section.

Another paragraph in section two.

## Section Three

The third section begins.

More formatting: *italic* and `code`.

A closing paragraph\nwith two lines.
";

fn build_reader(contents: &str, name: &str) -> (tempfile::TempDir, Reader) {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join(name);
    std::fs::write(&source, contents).unwrap();
    let out: PathBuf = dir.path().join("artifacts");
    compile_to_dir(&source, &out, &CompileOptions::default()).unwrap();
    let reader = create_reader(&out).unwrap();
    (dir, reader)
}

fn sample_reader() -> (tempfile::TempDir, Reader) {
    build_reader(SAMPLE_MD, "sample.md")
}

fn result_orders(reader: &Reader, query: &str) -> Vec<u32> {
    reader
        .search(query, &SearchOptions::default())
        .unwrap()
        .iter()
        .map(|r| r.order)
        .collect()
}

#[test]
fn search_returns_spans_containing_token_in_order() {
    let (_dir, reader) = sample_reader();
    assert_eq!(reader.get_span_count(), 9);

    let orders = result_orders(&reader, "section");
    assert_eq!(orders, vec![2, 3, 4, 5, 6]);

    // Every returned span really tokenizes to include the query token.
    for order in &orders {
        let span = reader.get_by_order(*order).unwrap();
        assert!(tokenize(&span.text).contains(&"section".to_string()));
    }
}

#[test]
fn search_is_case_insensitive() {
    let (_dir, reader) = sample_reader();
    let lower = result_orders(&reader, "section");
    assert_eq!(result_orders(&reader, "SECTION"), lower);
    assert_eq!(result_orders(&reader, "SeCtiOn"), lower);
}

#[test]
fn search_intersects_tokens() {
    let (_dir, reader) = sample_reader();
    let both = result_orders(&reader, "section two");
    assert_eq!(both, vec![2, 4]);

    // Dropping either word widens the result set.
    assert!(result_orders(&reader, "section").len() > both.len());
    assert!(result_orders(&reader, "two").len() > both.len());
}

#[test]
fn search_sees_through_formatting() {
    let (_dir, reader) = sample_reader();
    assert_eq!(result_orders(&reader, "bold"), vec![1]);
    assert_eq!(result_orders(&reader, "here"), vec![3]);
}

#[test]
fn search_empty_and_unknown_queries_are_empty() {
    let (_dir, reader) = sample_reader();
    assert!(reader.search("", &SearchOptions::default()).unwrap().is_empty());
    assert!(reader
        .search("nonexistentxyz123", &SearchOptions::default())
        .unwrap()
        .is_empty());
}

#[test]
fn search_fuzzy_reaches_one_edit_tokens() {
    let (_dir, reader) = sample_reader();
    let options = SearchOptions {
        fuzzy: Some(FuzzyOptions::default()),
        ..SearchOptions::default()
    };
    let results = reader.search("sektion", &options).unwrap();
    let orders: Vec<u32> = results.iter().map(|r| r.order).collect();
    assert_eq!(orders, vec![2, 3, 4, 5, 6]);
    assert!(results.iter().all(|r| r.hits.tokens[0].fuzzy));
}

#[test]
fn search_phrase_restricts_matches() {
    let (_dir, reader) = sample_reader();
    let results = reader
        .search("\"section two\"", &SearchOptions::default())
        .unwrap();
    let orders: Vec<u32> = results.iter().map(|r| r.order).collect();
    assert_eq!(orders, vec![2, 4]);
    for result in &results {
        assert!(!result.hits.phrases[0].ranges.is_empty());
    }
}

#[test]
fn search_ranked_orders_by_score() {
    let (_dir, reader) = sample_reader();
    let options = SearchOptions {
        rank: RankMode::Tfidf,
        ..SearchOptions::default()
    };
    let results = reader.search("section", &options).unwrap();
    assert_eq!(results.len(), 5);
    for window in results.windows(2) {
        assert!(
            window[0].score > window[1].score
                || (window[0].score == window[1].score && window[0].order < window[1].order)
        );
    }
}

#[test]
fn neighbors_window_is_clipped() {
    let (_dir, reader) = sample_reader();
    let ids = reader.neighbors(
        "span:000001",
        &NeighborOptions { before: 5, after: 1 },
    );
    assert_eq!(ids, vec!["span:000001", "span:000002"]);
}

#[test]
fn retrieve_merges_overlapping_windows_into_unique_packs() {
    let (_dir, reader) = sample_reader();
    let options = RetrieveOptions {
        limit: 5,
        per_hit_neighbors: 3,
        expand: ExpandMode::Neighbors,
        ..RetrieveOptions::default()
    };
    let packs = reader.retrieve("section", &options).unwrap();
    assert!(!packs.is_empty());
    assert!(packs.len() <= 5);

    let mut seen = BTreeSet::new();
    for pack in &packs {
        assert!(seen.insert(pack.pack_id.clone()), "duplicate pack id");
        // Paragraphs are unique and in document order inside each pack.
        let orders: Vec<u32> = pack
            .paragraph_ids
            .iter()
            .map(|id| reader.get_span(id).unwrap().order)
            .collect();
        let mut sorted = orders.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(orders, sorted);
    }
}

#[test]
fn retrieve_respects_char_budget() {
    let (_dir, reader) = sample_reader();
    let options = RetrieveOptions {
        per_hit_neighbors: 0,
        max_tokens: Some(60),
        ..RetrieveOptions::default()
    };
    let packs = reader.retrieve("section", &options).unwrap();
    let total: usize = packs.iter().map(|p| p.meta.char_count).sum();
    assert!(total <= 60);
    assert!(!packs.is_empty());
}

#[test]
fn retrieve_section_mode_uses_node_map() {
    let (_dir, reader) = sample_reader();
    let options = RetrieveOptions {
        expand: ExpandMode::Section,
        ..RetrieveOptions::default()
    };
    let packs = reader.retrieve("section two", &options).unwrap();
    assert_eq!(packs.len(), 1);
    assert!(packs[0].pack_id.starts_with("s:sec:"));
    assert!(matches!(packs[0].scope, PackScope::Section { .. }));
    // The whole Section Two: the H2 span and its two paragraphs.
    assert_eq!(packs[0].meta.span_count, 3);
    assert_eq!(packs[0].meta.heading_path, vec!["Section Two"]);
}

#[test]
fn retrieve_section_mode_on_plain_text_uses_synthetic_section() {
    let (_dir, reader) = build_reader("alpha one\n\nbeta two\n\ngamma three\n", "notes.txt");
    let options = RetrieveOptions {
        expand: ExpandMode::Section,
        ..RetrieveOptions::default()
    };
    let packs = reader.retrieve("beta", &options).unwrap();
    assert_eq!(packs.len(), 1);
    assert_eq!(packs[0].pack_id, "s:sec:000001");
    assert_eq!(packs[0].meta.span_count, 3);
    // Synthetic sections carry no heading path.
    assert!(packs[0].meta.heading_path.is_empty());
}

#[test]
fn assemble_prompt_cites_packs_in_order() {
    let (_dir, reader) = sample_reader();
    let packs = reader
        .retrieve(
            "section",
            &RetrieveOptions {
                limit: 2,
                ..RetrieveOptions::default()
            },
        )
        .unwrap();
    assert_eq!(packs.len(), 2);

    let prompt = reader.assemble_prompt(&PromptRequest::new("What is a section?", packs));
    assert!(prompt.user.contains("What is a section?"));
    assert!(prompt
        .user
        .contains("You may reference [\u{B9}]\u{2026}[\u{B2}]."));
    assert_eq!(prompt.citations.len(), 2);
    assert_eq!(prompt.citations[0].marker, "[\u{B9}]");
    assert_eq!(prompt.citations[1].marker, "[\u{B2}]");
    for citation in &prompt.citations {
        assert!(prompt.user.contains(&citation.marker));
        assert_eq!(citation.doc_id, reader.get_manifest().id);
    }
}

#[test]
fn corpus_invariants_hold() {
    let (_dir, reader) = sample_reader();

    // id <-> order bijection through both lookup paths.
    for order in 0..reader.get_span_count() as u32 {
        let span = reader.get_by_order(order).unwrap();
        assert_eq!(span.order, order);
        assert_eq!(reader.get_span(&span.id).unwrap().order, order);
    }

    // Sections partition the span id set.
    let map = reader.get_node_map().unwrap();
    let mut covered = BTreeSet::new();
    for section in map.sections.values() {
        for id in &section.paragraph_ids {
            assert!(reader.get_span(id).is_some());
            assert!(covered.insert(id.clone()), "span {id} in two sections");
        }
    }
    assert_eq!(covered.len(), reader.get_span_count());

    // Listed sections resolve.
    for section_id in reader.list_sections() {
        assert!(reader.get_section(&section_id).is_some());
    }

    // Report percentiles are ordered.
    let report = reader.get_build_report().unwrap();
    assert!(report.length_stats.p10 <= report.length_stats.p50);
    assert!(report.length_stats.p50 <= report.length_stats.p90);

    // Self-similarity of the deterministic embedder.
    let vector = embed_text("Sample Markdown Document");
    assert!((cosine_similarity(&vector, &vector).unwrap() - 1.0).abs() < 1e-9);
}

#[test]
fn tokenize_is_idempotent_over_corpus() {
    let (_dir, reader) = sample_reader();
    for order in 0..reader.get_span_count() as u32 {
        let span = reader.get_by_order(order).unwrap();
        let once = tokenize(&span.text);
        assert_eq!(tokenize(&once.join(" ")), once);
    }
}

#[test]
fn tf_cache_does_not_change_results() {
    let (_dir, reader) = sample_reader();
    let options = SearchOptions {
        rank: RankMode::Tfidf,
        ..SearchOptions::default()
    };
    let cold = reader.search("second section", &options).unwrap();
    reader.enable_tf_cache(16);
    let warm = reader.search("second section", &options).unwrap();
    let again = reader.search("second section", &options).unwrap();
    assert_eq!(cold, warm);
    assert_eq!(warm, again);
}

#[test]
fn hybrid_search_end_to_end() {
    let (_dir, reader) = sample_reader();
    let options = SearchOptions {
        rank: RankMode::Hybrid,
        ..SearchOptions::default()
    };
    let results = reader.search("second section", &options).unwrap();
    assert!(!results.is_empty());
    for window in results.windows(2) {
        assert!(window[0].score >= window[1].score);
    }
}
