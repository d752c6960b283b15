//! Artifact directory loader
//!
//! Reads and validates the four artifact files. `manifest.json` and
//! `spans.jsonl` are required; `nodeMap.json` and `buildReport.json` are
//! optional and silently absent when the file does not exist (but invalid
//! when present and malformed). The loader performs no transformations: it
//! never recomputes the node map or report from the spans, it only checks
//! that what is on disk is internally consistent.
//!
//! All errors carry the offending file path; JSONL errors also carry the
//! 1-based line number.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::artifact::{
    manifest::major_version, BuildReport, Manifest, NodeMap, SchemaVersions, Span,
    SCHEMA_BUILD_REPORT, SCHEMA_MANIFEST, SCHEMA_NODE_MAP, SCHEMA_SPANS,
};
use crate::embed::EMBEDDING_DIMS;

/// Required artifact file names.
pub const MANIFEST_FILE: &str = "manifest.json";
pub const SPANS_FILE: &str = "spans.jsonl";
/// Optional artifact file names.
pub const NODE_MAP_FILE: &str = "nodeMap.json";
pub const BUILD_REPORT_FILE: &str = "buildReport.json";

/// Errors raised while loading an artifact directory. Both kinds are fatal.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// A required artifact (or the directory itself) is absent.
    #[error("missing artifact: {}", .path.display())]
    Missing { path: PathBuf },

    /// An artifact is present but does not parse or validate.
    #[error("invalid artifact {}: {reason}", .path.display())]
    Invalid {
        path: PathBuf,
        /// 1-based record line for `spans.jsonl` failures.
        line: Option<usize>,
        reason: String,
    },
}

impl ArtifactError {
    fn invalid(path: &Path, reason: impl Into<String>) -> Self {
        Self::Invalid {
            path: path.to_path_buf(),
            line: None,
            reason: reason.into(),
        }
    }

    fn invalid_line(path: &Path, line: usize, reason: impl Into<String>) -> Self {
        Self::Invalid {
            path: path.to_path_buf(),
            line: Some(line),
            reason: format!("line {line}: {}", reason.into()),
        }
    }
}

/// The in-memory artifact set a reader is constructed from.
#[derive(Debug, Clone)]
pub struct LoadedArtifacts {
    pub manifest: Manifest,
    pub spans: Vec<Span>,
    pub node_map: Option<NodeMap>,
    pub build_report: Option<BuildReport>,
}

/// Load and validate an artifact directory.
pub fn load_artifacts(directory: impl AsRef<Path>) -> Result<LoadedArtifacts, ArtifactError> {
    let directory = directory.as_ref();
    if !directory.is_dir() {
        return Err(ArtifactError::Missing {
            path: directory.to_path_buf(),
        });
    }

    let manifest_path = directory.join(MANIFEST_FILE);
    let manifest: Manifest = parse_json(&manifest_path, &read_required(&manifest_path)?)?;
    check_schema_versions(&manifest_path, &manifest.schema)?;

    let spans_path = directory.join(SPANS_FILE);
    let spans = parse_spans(&spans_path, &read_required(&spans_path)?)?;
    validate_corpus(&manifest_path, &spans_path, &manifest, &spans)?;

    let node_map_path = directory.join(NODE_MAP_FILE);
    let node_map = match read_optional(&node_map_path)? {
        Some(contents) => {
            let map: NodeMap = parse_json(&node_map_path, &contents)?;
            validate_node_map(&node_map_path, &map, &spans)?;
            Some(map)
        }
        None => None,
    };

    let report_path = directory.join(BUILD_REPORT_FILE);
    let build_report = match read_optional(&report_path)? {
        Some(contents) => Some(parse_json::<BuildReport>(&report_path, &contents)?),
        None => None,
    };

    tracing::debug!(
        directory = %directory.display(),
        spans = spans.len(),
        node_map = node_map.is_some(),
        build_report = build_report.is_some(),
        "artifacts loaded"
    );

    Ok(LoadedArtifacts {
        manifest,
        spans,
        node_map,
        build_report,
    })
}

fn read_required(path: &Path) -> Result<String, ArtifactError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(contents),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(ArtifactError::Missing {
            path: path.to_path_buf(),
        }),
        Err(err) => Err(ArtifactError::invalid(path, err.to_string())),
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, ArtifactError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(ArtifactError::invalid(path, err.to_string())),
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(
    path: &Path,
    contents: &str,
) -> Result<T, ArtifactError> {
    serde_json::from_str(contents).map_err(|err| ArtifactError::invalid(path, err.to_string()))
}

/// Accept any artifact whose schema versions share the expected major.
fn check_schema_versions(path: &Path, schema: &SchemaVersions) -> Result<(), ArtifactError> {
    let expected = [
        ("manifest", schema.manifest.as_str(), SCHEMA_MANIFEST),
        ("spans", schema.spans.as_str(), SCHEMA_SPANS),
        ("nodeMap", schema.node_map.as_str(), SCHEMA_NODE_MAP),
        ("buildReport", schema.build_report.as_str(), SCHEMA_BUILD_REPORT),
    ];
    for (name, actual, wanted) in expected {
        let actual_major = major_version(actual)
            .ok_or_else(|| ArtifactError::invalid(path, format!("bad {name} schema version {actual:?}")))?;
        let wanted_major = major_version(wanted).expect("expected schema version");
        if actual_major != wanted_major {
            return Err(ArtifactError::invalid(
                path,
                format!("{name} schema major {actual_major} incompatible with {wanted}"),
            ));
        }
    }
    Ok(())
}

/// Parse `spans.jsonl`: one span per physical line, 1-based line numbers in
/// every error. A single trailing newline is tolerated; interior empty lines
/// are not.
fn parse_spans(path: &Path, contents: &str) -> Result<Vec<Span>, ArtifactError> {
    let lines: Vec<&str> = contents.split('\n').collect();
    let mut body_end = lines.len();
    if lines.last() == Some(&"") {
        body_end -= 1;
    }

    let mut spans = Vec::with_capacity(body_end);
    for (index, line) in lines[..body_end].iter().enumerate() {
        let line_number = index + 1;
        if line.is_empty() {
            return Err(ArtifactError::invalid_line(path, line_number, "empty line"));
        }
        let span: Span = serde_json::from_str(line)
            .map_err(|err| ArtifactError::invalid_line(path, line_number, err.to_string()))?;
        if span.text.is_empty() {
            return Err(ArtifactError::invalid_line(
                path,
                line_number,
                format!("span {} has empty text", span.id),
            ));
        }
        if let Some(embedding) = &span.embedding {
            if embedding.len() != EMBEDDING_DIMS {
                return Err(ArtifactError::invalid_line(
                    path,
                    line_number,
                    format!(
                        "span {} embedding has {} dims (expected {EMBEDDING_DIMS})",
                        span.id,
                        embedding.len()
                    ),
                ));
            }
        }
        spans.push(span);
    }
    Ok(spans)
}

/// Corpus-level invariants: unique ids, dense order permutation, and a
/// manifest span count that matches the record count.
fn validate_corpus(
    manifest_path: &Path,
    spans_path: &Path,
    manifest: &Manifest,
    spans: &[Span],
) -> Result<(), ArtifactError> {
    if manifest.span_count as usize != spans.len() {
        return Err(ArtifactError::invalid(
            manifest_path,
            format!(
                "spanCount {} does not match {} spans.jsonl records",
                manifest.span_count,
                spans.len()
            ),
        ));
    }

    let mut ids = HashSet::with_capacity(spans.len());
    let mut orders = HashSet::with_capacity(spans.len());
    for span in spans {
        if !ids.insert(span.id.as_str()) {
            return Err(ArtifactError::invalid(
                spans_path,
                format!("duplicate span id {}", span.id),
            ));
        }
        if span.order as usize >= spans.len() || !orders.insert(span.order) {
            return Err(ArtifactError::invalid(
                spans_path,
                format!("span orders are not a dense permutation (order {})", span.order),
            ));
        }
    }
    Ok(())
}

/// Node-map invariants: chapters reference existing sections, paragraphs
/// partition exactly the span id set, and the paragraph back-map agrees.
fn validate_node_map(path: &Path, map: &NodeMap, spans: &[Span]) -> Result<(), ArtifactError> {
    let span_ids: HashSet<&str> = spans.iter().map(|s| s.id.as_str()).collect();

    for (chapter_id, section_ids) in &map.chapters {
        for section_id in section_ids {
            if !map.sections.contains_key(section_id) {
                return Err(ArtifactError::invalid(
                    path,
                    format!("chapter {chapter_id} references unknown section {section_id}"),
                ));
            }
        }
    }

    let mut seen: HashMap<&str, &str> = HashMap::new();
    for (section_id, section) in &map.sections {
        for paragraph_id in &section.paragraph_ids {
            if !span_ids.contains(paragraph_id.as_str()) {
                return Err(ArtifactError::invalid(
                    path,
                    format!("section {section_id} references unknown span {paragraph_id}"),
                ));
            }
            if let Some(previous) = seen.insert(paragraph_id.as_str(), section_id.as_str()) {
                return Err(ArtifactError::invalid(
                    path,
                    format!("span {paragraph_id} appears in sections {previous} and {section_id}"),
                ));
            }
        }
    }
    if seen.len() != span_ids.len() {
        return Err(ArtifactError::invalid(
            path,
            format!(
                "sections cover {} spans but the corpus has {}",
                seen.len(),
                span_ids.len()
            ),
        ));
    }

    for (paragraph_id, section_id) in &map.paragraphs {
        match seen.get(paragraph_id.as_str()) {
            Some(&owner) if owner == section_id.as_str() => {}
            _ => {
                return Err(ArtifactError::invalid(
                    path,
                    format!("paragraph map disagrees with sections for span {paragraph_id}"),
                ));
            }
        }
    }
    if map.paragraphs.len() != span_ids.len() {
        return Err(ArtifactError::invalid(
            path,
            "paragraph map does not cover every span".to_string(),
        ));
    }

    Ok(())
}
