//! Manifest: corpus metadata and schema versions

use serde::{Deserialize, Serialize};

/// Expected semantic version of `manifest.json`.
pub const SCHEMA_MANIFEST: &str = "1.0.0";
/// Expected semantic version of `spans.jsonl`.
pub const SCHEMA_SPANS: &str = "1.0.0";
/// Expected semantic version of `nodeMap.json`.
pub const SCHEMA_NODE_MAP: &str = "1.0.0";
/// Expected semantic version of `buildReport.json`.
pub const SCHEMA_BUILD_REPORT: &str = "1.0.0";

/// How the source format was determined at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMode {
    /// Derived from the file extension.
    Auto,
    /// Supplied explicitly by the caller.
    Flag,
}

/// Normalization settings applied to the source. Fixed for schema 1.x.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Normalization {
    pub unicode: String,
    pub eol: String,
    pub blank_line_collapse: bool,
}

impl Default for Normalization {
    fn default() -> Self {
        Self {
            unicode: "NFC".to_string(),
            eol: "LF".to_string(),
            blank_line_collapse: true,
        }
    }
}

/// Per-artifact semantic versions carried inside the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaVersions {
    pub manifest: String,
    pub spans: String,
    pub node_map: String,
    pub build_report: String,
}

impl Default for SchemaVersions {
    fn default() -> Self {
        Self {
            manifest: SCHEMA_MANIFEST.to_string(),
            spans: SCHEMA_SPANS.to_string(),
            node_map: SCHEMA_NODE_MAP.to_string(),
            build_report: SCHEMA_BUILD_REPORT.to_string(),
        }
    }
}

/// Corpus metadata. One manifest per artifact directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Content-addressed corpus identifier, `corpus:` + first 12 hex chars
    /// of `source_hash`.
    pub id: String,
    /// Document title.
    pub title: String,
    /// ISO-8601 creation timestamp. The one non-reproducible output.
    pub created_at: String,
    /// Path of the source document as given to the build.
    pub source_path: String,
    /// Hex SHA-256 of the normalized source text.
    pub source_hash: String,
    /// UTF-8 byte length of the normalized source text.
    pub byte_length: u64,
    /// Number of spans in `spans.jsonl`.
    pub span_count: u32,
    /// Compiler version that produced the artifacts.
    pub version: String,
    /// Source format name, e.g. `markdown` or `text`.
    pub format: String,
    /// How the format was determined.
    pub detection: DetectionMode,
    /// Reader adapter that extracted the raw text.
    pub reader: String,
    pub normalization: Normalization,
    pub schema: SchemaVersions,
}

/// Parse the major component of a semantic version string.
pub fn major_version(version: &str) -> Option<u64> {
    version.split('.').next()?.parse().ok()
}
