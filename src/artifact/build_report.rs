//! BuildReport: quality metrics emitted by the build pipeline

use serde::{Deserialize, Serialize};

/// Spans shorter than this many characters are counted as warnings.
pub const SHORT_SPAN_CHARS: usize = 20;
/// Spans longer than this many characters are counted as warnings.
pub const LONG_SPAN_CHARS: usize = 2000;
/// Sample texts are truncated to this many characters.
pub const SAMPLE_TRUNCATE_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub span_count: u32,
    pub chapter_count: u32,
    pub section_count: u32,
    pub total_chars: u64,
    pub average_chars: f64,
    pub multi_line_spans: u32,
}

/// Span-length distribution. Percentiles use the nearest-rank method, so
/// each value is an actual span length, never an interpolation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LengthStats {
    pub min: usize,
    pub max: usize,
    pub p10: usize,
    pub p50: usize,
    pub p90: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportThresholds {
    pub short_span_chars: usize,
    pub long_span_chars: usize,
}

impl Default for ReportThresholds {
    fn default() -> Self {
        Self {
            short_span_chars: SHORT_SPAN_CHARS,
            long_span_chars: LONG_SPAN_CHARS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportWarnings {
    pub short_spans: u32,
    pub long_spans: u32,
    pub duplicate_spans: u32,
}

/// Shortest and longest span texts, truncated to [`SAMPLE_TRUNCATE_CHARS`]
/// with a trailing `…` when cut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSamples {
    pub shortest: String,
    pub longest: String,
}

/// Back-reference to the manifest this report was built alongside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    pub id: String,
    pub source_hash: String,
    pub created_at: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    pub summary: ReportSummary,
    pub length_stats: LengthStats,
    pub thresholds: ReportThresholds,
    pub warnings: ReportWarnings,
    pub samples: ReportSamples,
    pub provenance: Provenance,
}

/// Truncate a sample text, appending `…` when anything was cut.
pub fn truncate_sample(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(SAMPLE_TRUNCATE_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}\u{2026}")
    } else {
        head
    }
}

/// Nearest-rank percentile over a sorted slice: the value at rank
/// `ceil(p/100 * n)`, 1-based. The slice must be non-empty and sorted.
pub fn nearest_rank(sorted: &[usize], percentile: u32) -> usize {
    debug_assert!(!sorted.is_empty());
    let n = sorted.len();
    let rank = ((percentile as f64 / 100.0) * n as f64).ceil() as usize;
    sorted[rank.clamp(1, n) - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_sample_short_text_untouched() {
        assert_eq!(truncate_sample("short"), "short");
    }

    #[test]
    fn test_truncate_sample_cuts_with_ellipsis() {
        let long = "x".repeat(300);
        let sample = truncate_sample(&long);
        assert_eq!(sample.chars().count(), SAMPLE_TRUNCATE_CHARS + 1);
        assert!(sample.ends_with('\u{2026}'));
    }

    #[test]
    fn test_truncate_sample_exact_boundary() {
        let exact = "y".repeat(SAMPLE_TRUNCATE_CHARS);
        assert_eq!(truncate_sample(&exact), exact);
    }

    #[test]
    fn test_nearest_rank_single_element() {
        assert_eq!(nearest_rank(&[7], 10), 7);
        assert_eq!(nearest_rank(&[7], 90), 7);
    }

    #[test]
    fn test_nearest_rank_ten_elements() {
        let sorted: Vec<usize> = (1..=10).collect();
        assert_eq!(nearest_rank(&sorted, 10), 1);
        assert_eq!(nearest_rank(&sorted, 50), 5);
        assert_eq!(nearest_rank(&sorted, 90), 9);
    }

    #[test]
    fn test_nearest_rank_ordering_invariant() {
        let sorted = vec![3, 3, 8, 21, 40];
        let p10 = nearest_rank(&sorted, 10);
        let p50 = nearest_rank(&sorted, 50);
        let p90 = nearest_rank(&sorted, 90);
        assert!(p10 <= p50 && p50 <= p90);
    }

    #[test]
    fn test_report_roundtrip() {
        let report = BuildReport {
            summary: ReportSummary {
                span_count: 9,
                chapter_count: 1,
                section_count: 3,
                total_chars: 420,
                average_chars: 46.7,
                multi_line_spans: 1,
            },
            length_stats: LengthStats {
                min: 10,
                max: 120,
                p10: 11,
                p50: 40,
                p90: 100,
            },
            thresholds: ReportThresholds::default(),
            warnings: ReportWarnings {
                short_spans: 2,
                long_spans: 0,
                duplicate_spans: 0,
            },
            samples: ReportSamples {
                shortest: "tiny".to_string(),
                longest: "big".to_string(),
            },
            provenance: Provenance {
                id: "corpus:0123456789ab".to_string(),
                source_hash: "deadbeef".to_string(),
                created_at: "2026-01-01T00:00:00Z".to_string(),
                version: "0.1.0".to_string(),
            },
        };
        let json = serde_json::to_string_pretty(&report).unwrap();
        assert!(json.contains("\"lengthStats\""));
        assert!(json.contains("\"shortSpanChars\""));
        let back: BuildReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
