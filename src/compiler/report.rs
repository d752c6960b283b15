//! Build report computation

use std::collections::HashSet;

use crate::artifact::{
    build_report::{nearest_rank, truncate_sample},
    BuildReport, LengthStats, Manifest, Provenance, ReportSamples, ReportSummary,
    ReportThresholds, ReportWarnings, Span, LONG_SPAN_CHARS, SHORT_SPAN_CHARS,
};

/// Compute the quality report for a compiled corpus. Expects at least one
/// span (the compiler rejects empty documents before this point).
pub(crate) fn build_report(
    spans: &[Span],
    chapter_count: usize,
    section_count: usize,
    manifest: &Manifest,
) -> BuildReport {
    let lengths: Vec<usize> = spans.iter().map(Span::char_count).collect();
    let total_chars: u64 = lengths.iter().map(|&l| l as u64).sum();
    let multi_line_spans = spans.iter().filter(|s| s.is_multi_line()).count() as u32;

    let mut sorted = lengths.clone();
    sorted.sort_unstable();

    let mut distinct_texts = HashSet::new();
    let duplicate_spans = spans
        .iter()
        .filter(|span| !distinct_texts.insert(span.text.as_str()))
        .count() as u32;

    let shortest = spans
        .iter()
        .min_by_key(|s| s.char_count())
        .expect("non-empty corpus");
    let longest = spans
        .iter()
        .max_by_key(|s| s.char_count())
        .expect("non-empty corpus");

    BuildReport {
        summary: ReportSummary {
            span_count: spans.len() as u32,
            chapter_count: chapter_count as u32,
            section_count: section_count as u32,
            total_chars,
            average_chars: total_chars as f64 / spans.len() as f64,
            multi_line_spans,
        },
        length_stats: LengthStats {
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            p10: nearest_rank(&sorted, 10),
            p50: nearest_rank(&sorted, 50),
            p90: nearest_rank(&sorted, 90),
        },
        thresholds: ReportThresholds::default(),
        warnings: ReportWarnings {
            short_spans: lengths.iter().filter(|&&l| l < SHORT_SPAN_CHARS).count() as u32,
            long_spans: lengths.iter().filter(|&&l| l > LONG_SPAN_CHARS).count() as u32,
            duplicate_spans,
        },
        samples: ReportSamples {
            shortest: truncate_sample(&shortest.text),
            longest: truncate_sample(&longest.text),
        },
        provenance: Provenance {
            id: manifest.id.clone(),
            source_hash: manifest.source_hash.clone(),
            created_at: manifest.created_at.clone(),
            version: manifest.version.clone(),
        },
    }
}
