//! NodeMap: the chapter/section/paragraph hierarchy

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Corpus-level node of the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// The corpus id from the manifest.
    pub id: String,
    pub title: String,
}

/// A section and its member paragraphs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Span ids in document order.
    pub paragraph_ids: Vec<String>,
    /// Heading text. Real sections keep the raw heading line (`## Title`);
    /// synthetic sections carry the plain document title.
    pub heading: String,
}

/// Hierarchical structure over the span list.
///
/// Invariants: every span id appears exactly once across all sections'
/// `paragraph_ids` and exactly once as a key of `paragraphs`; every section
/// id referenced by a chapter exists in `sections`; a section's
/// `paragraph_ids` are in document order. Maps are ordered so serialization
/// is reproducible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMap {
    pub book: Book,
    /// Chapter id to its section ids, in document order.
    pub chapters: BTreeMap<String, Vec<String>>,
    pub sections: BTreeMap<String, Section>,
    /// Span id to its parent section id.
    pub paragraphs: BTreeMap<String, String>,
}

impl NodeMap {
    /// Parent section id of a span, if the span is known.
    pub fn section_of(&self, span_id: &str) -> Option<&str> {
        self.paragraphs.get(span_id).map(String::as_str)
    }

    /// Section ids in sorted order.
    pub fn section_ids(&self) -> Vec<String> {
        self.sections.keys().cloned().collect()
    }
}
