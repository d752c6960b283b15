//! Lower-case alphanumeric tokenization
//!
//! Rules, applied in order: case-fold to ASCII lowercase, treat every maximal
//! run of characters outside `[a-z0-9]` as a single separator, split, drop
//! empty tokens. Document order of the surviving tokens is preserved.
//!
//! Non-ASCII letters are separators. This is an accepted limitation; it is
//! consistent between indexing and querying, which is what matters for
//! correctness.

/// Split text into lower-case alphanumeric tokens.
///
/// Idempotent on its own output: `tokenize(&tokens.join(" "))` returns
/// `tokens` for any prior tokenization result.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        let folded = ch.to_ascii_lowercase();
        if folded.is_ascii_alphanumeric() {
            current.push(folded);
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}
