//! Build pipeline: compile one source document into the artifact set
//!
//! ```text
//! source file ─▶ normalize ─▶ split ─▶ structure ─▶ embed ─▶ report ─▶ write
//! ```
//!
//! Identical input bytes produce identical artifacts apart from the
//! `createdAt` timestamp: the corpus id is content-addressed from the
//! SHA-256 of the normalized text, span ids and orders are positional, and
//! embeddings are deterministic hash projections.

mod normalize;
mod report;
mod structure;
mod writer;

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use sha2::{Digest, Sha256};

use crate::artifact::{
    Book, BuildReport, DetectionMode, Manifest, NodeMap, Normalization, SchemaVersions, Span,
};
use crate::embed::embed_text;
use crate::loader::LoadedArtifacts;

pub use normalize::{normalize_text, split_fragments};

/// Declared source formats. Anything else is rejected; format sniffing is
/// out of scope by design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Markdown,
    PlainText,
}

impl Format {
    /// Extension mapping used for `detection = auto`.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "md" | "markdown" => Some(Self::Markdown),
            "txt" => Some(Self::PlainText),
            _ => None,
        }
    }

    /// Format name recorded in the manifest.
    pub fn name(self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::PlainText => "text",
        }
    }

    /// Reader adapter name recorded in the manifest.
    pub fn reader_name(self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::PlainText => "plain-text",
        }
    }
}

/// Options for [`compile`].
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Explicit format; `None` derives it from the file extension.
    pub format: Option<Format>,
    /// Explicit title; `None` uses the first H1 (Markdown) or the file stem.
    pub title: Option<String>,
}

/// Errors from the build pipeline.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported source format: {0}")]
    UnsupportedFormat(String),

    #[error("document is empty after normalization")]
    EmptyDocument,

    #[error("cannot serialize {}: {reason}", .path.display())]
    Serialize { path: PathBuf, reason: String },
}

/// A compiled corpus, ready to write or to wrap in a reader directly.
#[derive(Debug, Clone)]
pub struct CompiledCorpus {
    pub manifest: Manifest,
    pub spans: Vec<Span>,
    pub node_map: NodeMap,
    pub build_report: BuildReport,
}

impl From<CompiledCorpus> for LoadedArtifacts {
    fn from(corpus: CompiledCorpus) -> Self {
        Self {
            manifest: corpus.manifest,
            spans: corpus.spans,
            node_map: Some(corpus.node_map),
            build_report: Some(corpus.build_report),
        }
    }
}

/// Compile a source file into an in-memory corpus.
pub fn compile(
    source_path: impl AsRef<Path>,
    options: &CompileOptions,
) -> Result<CompiledCorpus, CompileError> {
    let source_path = source_path.as_ref();
    let raw = std::fs::read_to_string(source_path).map_err(|source| CompileError::Io {
        path: source_path.to_path_buf(),
        source,
    })?;

    let (format, detection) = resolve_format(source_path, options)?;
    compile_text(&raw, source_path, format, detection, options)
}

/// Compile a source file and write the artifact set into `out_dir`.
pub fn compile_to_dir(
    source_path: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    options: &CompileOptions,
) -> Result<CompiledCorpus, CompileError> {
    let corpus = compile(source_path, options)?;
    writer::write_artifacts(&corpus, out_dir.as_ref())?;
    Ok(corpus)
}

fn resolve_format(
    source_path: &Path,
    options: &CompileOptions,
) -> Result<(Format, DetectionMode), CompileError> {
    if let Some(format) = options.format {
        return Ok((format, DetectionMode::Flag));
    }
    let extension = source_path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();
    match Format::from_extension(&extension) {
        Some(format) => Ok((format, DetectionMode::Auto)),
        None => Err(CompileError::UnsupportedFormat(extension)),
    }
}

fn compile_text(
    raw: &str,
    source_path: &Path,
    format: Format,
    detection: DetectionMode,
    options: &CompileOptions,
) -> Result<CompiledCorpus, CompileError> {
    // Both declared adapters read the file as UTF-8 text verbatim; the
    // adapter name only records which structure pass applies.
    let normalized = normalize_text(raw);
    if normalized.is_empty() {
        return Err(CompileError::EmptyDocument);
    }

    let source_hash = hex_sha256(&normalized);
    let corpus_id = format!("corpus:{}", &source_hash[..12]);
    let byte_length = normalized.len() as u64;

    let fragments = split_fragments(&normalized);
    let title = options.title.clone().unwrap_or_else(|| {
        match format {
            Format::Markdown => structure::first_h1(&fragments),
            Format::PlainText => None,
        }
        .unwrap_or_else(|| file_stem(source_path))
    });

    let mut structure = match format {
        Format::Markdown => structure::markdown_structure(&fragments, &title),
        Format::PlainText => structure::plain_text_structure(&fragments, &title),
    };
    for span in &mut structure.spans {
        span.embedding = Some(embed_text(&span.text));
    }

    let manifest = Manifest {
        id: corpus_id.clone(),
        title: title.clone(),
        created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        source_path: source_path.to_string_lossy().into_owned(),
        source_hash,
        byte_length,
        span_count: structure.spans.len() as u32,
        version: env!("CARGO_PKG_VERSION").to_string(),
        format: format.name().to_string(),
        detection,
        reader: format.reader_name().to_string(),
        normalization: Normalization::default(),
        schema: SchemaVersions::default(),
    };

    let build_report = report::build_report(
        &structure.spans,
        structure.chapters.len(),
        structure.sections.len(),
        &manifest,
    );

    let node_map = NodeMap {
        book: Book {
            id: corpus_id,
            title,
        },
        chapters: structure.chapters,
        sections: structure.sections,
        paragraphs: structure.paragraphs,
    };

    tracing::debug!(
        source = %source_path.display(),
        spans = manifest.span_count,
        chapters = node_map.chapters.len(),
        sections = node_map.sections.len(),
        "corpus compiled"
    );

    Ok(CompiledCorpus {
        manifest,
        spans: structure.spans,
        node_map,
        build_report,
    })
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "untitled".to_string())
}

fn hex_sha256(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut hex = String::with_capacity(64);
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}
