//! Source text normalization
//!
//! Applied before hashing and splitting, in a fixed order so the same bytes
//! always produce the same normalized text: Unicode NFC, CRLF to LF, trim
//! the document ends, collapse runs of three or more newlines to exactly
//! two. `spans` are later split on runs of two or more newlines, so after
//! this pass every paragraph boundary is exactly one blank line.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static BLANK_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank run pattern"));

static SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").expect("split pattern"));

/// Normalize raw source text.
pub fn normalize_text(raw: &str) -> String {
    let composed: String = raw.nfc().collect();
    let unix = composed.replace("\r\n", "\n");
    let trimmed = unix.trim();
    BLANK_RUN_RE.replace_all(trimmed, "\n\n").into_owned()
}

/// Split normalized text into trimmed, non-empty paragraph fragments.
pub fn split_fragments(normalized: &str) -> Vec<&str> {
    SPLIT_RE
        .split(normalized)
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_crlf_to_lf() {
        assert_eq!(normalize_text("a\r\nb"), "a\nb");
    }

    #[test]
    fn test_normalize_trims_document_ends() {
        assert_eq!(normalize_text("\n\n  hello  \n\n"), "hello");
    }

    #[test]
    fn test_normalize_collapses_blank_runs() {
        assert_eq!(normalize_text("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(normalize_text("a\n\nb"), "a\n\nb");
        assert_eq!(normalize_text("a\nb"), "a\nb");
    }

    #[test]
    fn test_normalize_nfc_composition() {
        // e + combining acute composes to the single code point.
        let decomposed = "cafe\u{301}";
        assert_eq!(normalize_text(decomposed), "caf\u{e9}");
    }

    #[test]
    fn test_normalize_idempotent() {
        let messy = "  a\r\n\r\n\r\nb\n\n\n\nc  ";
        let once = normalize_text(messy);
        assert_eq!(normalize_text(&once), once);
    }

    #[test]
    fn test_split_fragments() {
        assert_eq!(split_fragments("a\n\nb\n\nc"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_split_fragments_keeps_single_newlines() {
        assert_eq!(split_fragments("line one\nline two\n\nnext"), vec![
            "line one\nline two",
            "next"
        ]);
    }

    #[test]
    fn test_split_fragments_drops_empty() {
        assert!(split_fragments("").is_empty());
    }
}
