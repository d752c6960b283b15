//! On-disk artifact data model
//!
//! A compiled corpus is four files in one directory:
//!
//! | file | required | contents |
//! |------|----------|----------|
//! | `manifest.json` | yes | corpus metadata and schema versions |
//! | `spans.jsonl` | yes | one [`Span`] per line, in `order` order |
//! | `nodeMap.json` | no | chapter/section/paragraph hierarchy |
//! | `buildReport.json` | no | quality metrics from the build |
//!
//! Every entity here is immutable after construction. Serialized field names
//! are camelCase; `spans.jsonl` is strictly one compact record per physical
//! line, the other three files may be pretty-printed.

pub mod build_report;
pub mod manifest;
pub mod node_map;
pub mod span;

pub use build_report::{
    BuildReport, LengthStats, Provenance, ReportSamples, ReportSummary, ReportThresholds,
    ReportWarnings, LONG_SPAN_CHARS, SAMPLE_TRUNCATE_CHARS, SHORT_SPAN_CHARS,
};
pub use manifest::{
    DetectionMode, Manifest, Normalization, SchemaVersions, SCHEMA_BUILD_REPORT, SCHEMA_MANIFEST,
    SCHEMA_NODE_MAP, SCHEMA_SPANS,
};
pub use node_map::{Book, NodeMap, Section};
pub use span::Span;
