//! Quoted-phrase extraction and exact phrase matching
//!
//! A query like `rust "lexical index" tokens` splits into the phrase
//! `lexical index` and the residual tokens `rust` and `tokens`. Phrase
//! matching is exact on normalized text: both the phrase and the span text
//! are lower-cased with punctuation runs collapsed to single spaces, and the
//! match offsets are reported in that normalized coordinate system.

use super::tokenizer::tokenize;

/// A query decomposed into quoted phrases and residual tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    /// Raw phrase contents, in order of appearance (quotes stripped).
    pub phrases: Vec<String>,
    /// Tokens from the residual string after phrase regions are blanked out.
    pub tokens: Vec<String>,
}

/// Extract quoted phrases from a query and tokenize the residual.
///
/// Every maximal substring enclosed by a pair of straight double quotes
/// becomes a phrase. A dangling quote with no partner is treated as ordinary
/// separator text.
pub fn parse_query(query: &str) -> ParsedQuery {
    let mut phrases = Vec::new();
    let mut residual = String::with_capacity(query.len());
    let mut rest = query;

    while let Some(open) = rest.find('"') {
        residual.push_str(&rest[..open]);
        match rest[open + 1..].find('"') {
            Some(close) => {
                phrases.push(rest[open + 1..open + 1 + close].to_string());
                residual.push(' ');
                rest = &rest[open + close + 2..];
            }
            None => {
                // Unpaired quote: the remainder is residual text.
                residual.push_str(&rest[open + 1..]);
                rest = "";
            }
        }
    }
    residual.push_str(rest);

    ParsedQuery {
        phrases,
        tokens: tokenize(&residual),
    }
}

/// Normalize a phrase for exact matching.
///
/// Same character rules as tokenization, but word boundaries survive as
/// single interior spaces: `"Lexical  Index!"` becomes `"lexical index"`.
pub fn normalize_phrase(phrase: &str) -> String {
    tokenize(phrase).join(" ")
}

/// Find non-overlapping, leftmost-first occurrences of `phrase` in `text`.
///
/// Offsets are `(start, end)` in the normalized-text coordinate system
/// (normalized text is ASCII, so byte and character offsets coincide).
/// An empty phrase yields no matches.
pub fn find_phrase_matches(text: &str, phrase: &str) -> Vec<(usize, usize)> {
    let needle = normalize_phrase(phrase);
    if needle.is_empty() {
        return Vec::new();
    }
    let haystack = normalize_phrase(text);

    let mut matches = Vec::new();
    let mut from = 0;
    while let Some(rel) = haystack[from..].find(&needle) {
        let start = from + rel;
        let end = start + needle.len();
        matches.push((start, end));
        from = end;
    }
    matches
}

/// AND over phrases: true when every phrase occurs at least once in `text`.
pub fn contains_all_phrases(text: &str, phrases: &[String]) -> bool {
    let haystack = normalize_phrase(text);
    phrases.iter().all(|phrase| {
        let needle = normalize_phrase(phrase);
        !needle.is_empty() && haystack.contains(&needle)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_no_phrases() {
        let parsed = parse_query("plain token query");
        assert!(parsed.phrases.is_empty());
        assert_eq!(parsed.tokens, vec!["plain", "token", "query"]);
    }

    #[test]
    fn test_parse_query_single_phrase() {
        let parsed = parse_query("before \"exact match\" after");
        assert_eq!(parsed.phrases, vec!["exact match"]);
        assert_eq!(parsed.tokens, vec!["before", "after"]);
    }

    #[test]
    fn test_parse_query_multiple_phrases_in_order() {
        let parsed = parse_query("\"first one\" mid \"second one\"");
        assert_eq!(parsed.phrases, vec!["first one", "second one"]);
        assert_eq!(parsed.tokens, vec!["mid"]);
    }

    #[test]
    fn test_parse_query_adjacent_phrases_stay_separated() {
        // The blanked-out regions must not glue neighboring words together.
        let parsed = parse_query("a\"x\"b");
        assert_eq!(parsed.phrases, vec!["x"]);
        assert_eq!(parsed.tokens, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_query_dangling_quote() {
        let parsed = parse_query("start \"unterminated rest");
        assert!(parsed.phrases.is_empty());
        assert_eq!(parsed.tokens, vec!["start", "unterminated", "rest"]);
    }

    #[test]
    fn test_parse_query_empty_phrase_is_kept() {
        let parsed = parse_query("\"\" token");
        assert_eq!(parsed.phrases, vec![""]);
        assert_eq!(parsed.tokens, vec!["token"]);
    }

    #[test]
    fn test_normalize_phrase() {
        assert_eq!(normalize_phrase("  Lexical   INDEX!"), "lexical index");
        assert_eq!(normalize_phrase("**bold**"), "bold");
        assert_eq!(normalize_phrase("..."), "");
    }

    #[test]
    fn test_find_phrase_matches_single() {
        let matches = find_phrase_matches("The lexical index works", "lexical index");
        assert_eq!(matches, vec![(4, 17)]);
    }

    #[test]
    fn test_find_phrase_matches_ignores_case_and_punctuation() {
        let matches = find_phrase_matches("A **Lexical** Index here", "lexical index");
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn test_find_phrase_matches_non_overlapping_leftmost() {
        // "aa aa aa" contains "aa aa" at 0..5; the next scan starts at 5,
        // so the overlapping occurrence at 3..8 is skipped.
        let matches = find_phrase_matches("aa aa aa", "aa aa");
        assert_eq!(matches, vec![(0, 5)]);
    }

    #[test]
    fn test_find_phrase_matches_repeated() {
        let matches = find_phrase_matches("dog cat dog cat", "dog cat");
        assert_eq!(matches, vec![(0, 7), (8, 15)]);
    }

    #[test]
    fn test_find_phrase_matches_empty_phrase() {
        assert!(find_phrase_matches("anything", "").is_empty());
        assert!(find_phrase_matches("anything", "!!!").is_empty());
    }

    #[test]
    fn test_contains_all_phrases() {
        let phrases = vec!["quick brown".to_string(), "lazy dog".to_string()];
        assert!(contains_all_phrases(
            "the quick brown fox and the lazy dog",
            &phrases
        ));
        assert!(!contains_all_phrases("the quick brown fox", &phrases));
    }

    #[test]
    fn test_contains_all_phrases_empty_list() {
        assert!(contains_all_phrases("anything", &[]));
    }

    #[test]
    fn test_contains_all_phrases_empty_phrase_never_matches() {
        assert!(!contains_all_phrases("anything", &[String::new()]));
    }
}
