//! Deterministic mini-embedder
//!
//! Generates a 128-dim unit vector from text via a hash projection: each
//! dimension is a 32-bit rolling hash of `"{token}:{dim}"` mapped into
//! `[-1, 1]`, averaged over tokens and L2-normalized. The result is not
//! semantically strong; it is a fully deterministic, dependency-free
//! similarity signal that captures co-occurrence of exact tokens.
//!
//! Embeddings are computed once at build time and persisted in the span
//! artifact, so query-time cost is a single 128-dim embedding of the query
//! plus dot products.

use crate::text::tokenize;

/// Number of dimensions in every embedding.
pub const EMBEDDING_DIMS: usize = 128;

/// Errors from vector operations.
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },
}

/// Embed text into a 128-dim unit vector.
///
/// Tokenizes the input; with no tokens the zero vector is returned. The
/// per-token vectors are averaged component-wise and L2-normalized; a zero
/// magnitude also yields the zero vector.
pub fn embed_text(text: &str) -> Vec<f64> {
    let tokens = tokenize(text);
    let mut acc = vec![0.0f64; EMBEDDING_DIMS];
    if tokens.is_empty() {
        return acc;
    }

    for token in &tokens {
        for (dim, slot) in acc.iter_mut().enumerate() {
            let hash = rolling_hash(&format!("{token}:{dim}"));
            *slot += f64::from(hash.rem_euclid(10_000)) / 5_000.0 - 1.0;
        }
    }

    let count = tokens.len() as f64;
    for slot in acc.iter_mut() {
        *slot /= count;
    }

    let magnitude = acc.iter().map(|v| v * v).sum::<f64>().sqrt();
    if magnitude > 0.0 {
        for slot in acc.iter_mut() {
            *slot /= magnitude;
        }
    }
    acc
}

/// Cosine similarity of two unit vectors: their dot product, in `[-1, 1]`.
pub fn cosine_similarity(u: &[f64], v: &[f64]) -> Result<f64, EmbedError> {
    if u.len() != v.len() {
        return Err(EmbedError::DimensionMismatch {
            left: u.len(),
            right: v.len(),
        });
    }
    Ok(u.iter().zip(v.iter()).map(|(a, b)| a * b).sum())
}

/// 32-bit signed rolling hash over UTF-16 code units:
/// `hash = (hash << 5) - hash + unit`, wrapping.
fn rolling_hash(s: &str) -> i32 {
    let mut hash: i32 = 0;
    for unit in s.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit));
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embed_dims() {
        assert_eq!(embed_text("hello world").len(), EMBEDDING_DIMS);
    }

    #[test]
    fn test_embed_deterministic() {
        assert_eq!(embed_text("hello world"), embed_text("hello world"));
    }

    #[test]
    fn test_embed_different_inputs_differ() {
        assert_ne!(embed_text("hello"), embed_text("world"));
    }

    #[test]
    fn test_embed_unit_length() {
        let v = embed_text("the quick brown fox");
        let magnitude = v.iter().map(|x| x * x).sum::<f64>().sqrt();
        assert!((magnitude - 1.0).abs() < 1e-9, "magnitude = {magnitude}");
    }

    #[test]
    fn test_embed_empty_text_is_zero_vector() {
        let v = embed_text("");
        assert_eq!(v, vec![0.0; EMBEDDING_DIMS]);
        let v = embed_text("--- !!!");
        assert_eq!(v, vec![0.0; EMBEDDING_DIMS]);
    }

    #[test]
    fn test_embed_normalization_insensitive_to_case() {
        // Tokenization happens first, so case variants embed identically.
        assert_eq!(embed_text("Hello World"), embed_text("hello world"));
    }

    #[test]
    fn test_cosine_self_similarity_is_one() {
        let v = embed_text("some example text");
        let sim = cosine_similarity(&v, &v).unwrap();
        assert!((sim - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_range() {
        let u = embed_text("alpha beta gamma");
        let v = embed_text("delta epsilon zeta");
        let sim = cosine_similarity(&u, &v).unwrap();
        assert!((-1.0..=1.0).contains(&sim));
    }

    #[test]
    fn test_cosine_dimension_mismatch() {
        let u = vec![0.0; EMBEDDING_DIMS];
        let v = vec![0.0; 64];
        assert!(matches!(
            cosine_similarity(&u, &v),
            Err(EmbedError::DimensionMismatch { left: 128, right: 64 })
        ));
    }

    #[test]
    fn test_rolling_hash_matches_known_shape() {
        // Same prefix, different dimension suffix, different hashes.
        assert_ne!(rolling_hash("token:0"), rolling_hash("token:1"));
        // Stable across calls.
        assert_eq!(rolling_hash("token:0"), rolling_hash("token:0"));
    }
}
