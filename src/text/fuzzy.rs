//! Edit-distance-1 token neighborhoods
//!
//! Fuzzy matching never touches the index itself: a query token is expanded
//! into every string at Levenshtein distance exactly 1 over `[a-z0-9]`, the
//! expansion is intersected with the corpus vocabulary, and the survivors are
//! looked up as ordinary exact tokens. The neighborhood of a token of length
//! n has n deletions, 35n substitutions and 36(n+1) insertions, so the
//! candidate set stays small enough to enumerate outright.

use std::collections::BTreeSet;
use std::collections::HashSet;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Enumerate every string at edit distance exactly 1 from `token`.
///
/// One character deleted, one substituted (same-character substitutions are
/// skipped, so the token itself is never produced), or one inserted at any
/// position including both ends. Duplicates are tolerated; callers dedupe.
pub fn one_edit_neighborhood(token: &str) -> Vec<String> {
    let chars: Vec<char> = token.chars().collect();
    let n = chars.len();
    let mut out = Vec::with_capacity(n + 35 * n + 36 * (n + 1));

    // Deletions.
    for skip in 0..n {
        let mut candidate = String::with_capacity(n.saturating_sub(1));
        for (i, &ch) in chars.iter().enumerate() {
            if i != skip {
                candidate.push(ch);
            }
        }
        out.push(candidate);
    }

    // Substitutions.
    for pos in 0..n {
        for &byte in ALPHABET {
            let replacement = byte as char;
            if replacement == chars[pos] {
                continue;
            }
            let mut candidate = String::with_capacity(n);
            for (i, &ch) in chars.iter().enumerate() {
                candidate.push(if i == pos { replacement } else { ch });
            }
            out.push(candidate);
        }
    }

    // Insertions.
    for pos in 0..=n {
        for &byte in ALPHABET {
            let mut candidate = String::with_capacity(n + 1);
            candidate.extend(chars[..pos].iter());
            candidate.push(byte as char);
            candidate.extend(chars[pos..].iter());
            out.push(candidate);
        }
    }

    out
}

/// Intersect the one-edit neighborhood of `token` with the vocabulary.
///
/// Survivors are deduplicated, sorted lexicographically for determinism, and
/// truncated to `max_candidates`.
pub fn fuzzy_candidates(
    token: &str,
    vocabulary: &HashSet<String>,
    max_candidates: usize,
) -> Vec<String> {
    let survivors: BTreeSet<String> = one_edit_neighborhood(token)
        .into_iter()
        .filter(|candidate| vocabulary.contains(candidate))
        .collect();

    survivors.into_iter().take(max_candidates).collect()
}
