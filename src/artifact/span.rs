//! Span: one paragraph of the normalized source

use serde::{Deserialize, Serialize};

/// One paragraph-level unit of normalized text.
///
/// `order` values are dense from 0 across the corpus and `id` ↔ `order` is a
/// bijection; both are established at build time and never change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    /// Opaque stable identifier, conventionally `span:NNNNNN`.
    pub id: String,
    /// Normalized text; non-empty, may contain interior newlines.
    pub text: String,
    /// Position in document order, dense from 0.
    pub order: u32,
    /// Ancestor heading texts, outermost first. Empty for plain text.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub heading_path: Vec<String>,
    /// 128-dim unit vector, or absent when the build skipped embeddings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f64>>,
}

impl Span {
    /// Character count of the span text.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// True when the text contains interior newlines.
    pub fn is_multi_line(&self) -> bool {
        self.text.contains('\n')
    }
}
