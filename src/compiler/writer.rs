//! Artifact serialization
//!
//! All four files are UTF-8 with LF line terminators. `spans.jsonl` is
//! strictly one compact record per physical line; the other three are
//! pretty-printed for inspection. Output is byte-identical across runs for
//! the same corpus contents.

use std::path::Path;

use serde::Serialize;

use crate::compiler::{CompileError, CompiledCorpus};
use crate::loader::{BUILD_REPORT_FILE, MANIFEST_FILE, NODE_MAP_FILE, SPANS_FILE};

pub(crate) fn write_artifacts(
    corpus: &CompiledCorpus,
    out_dir: &Path,
) -> Result<(), CompileError> {
    std::fs::create_dir_all(out_dir).map_err(|source| CompileError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;

    write_pretty(&out_dir.join(MANIFEST_FILE), &corpus.manifest)?;
    write_spans(&out_dir.join(SPANS_FILE), corpus)?;
    write_pretty(&out_dir.join(NODE_MAP_FILE), &corpus.node_map)?;
    write_pretty(&out_dir.join(BUILD_REPORT_FILE), &corpus.build_report)?;

    tracing::debug!(
        out_dir = %out_dir.display(),
        spans = corpus.spans.len(),
        "artifacts written"
    );
    Ok(())
}

fn write_pretty<T: Serialize>(path: &Path, value: &T) -> Result<(), CompileError> {
    let mut contents =
        serde_json::to_string_pretty(value).map_err(|err| CompileError::Serialize {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
    contents.push('\n');
    std::fs::write(path, contents).map_err(|source| CompileError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_spans(path: &Path, corpus: &CompiledCorpus) -> Result<(), CompileError> {
    let mut contents = String::new();
    for span in &corpus.spans {
        let line = serde_json::to_string(span).map_err(|err| CompileError::Serialize {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        contents.push_str(&line);
        contents.push('\n');
    }
    std::fs::write(path, contents).map_err(|source| CompileError::Io {
        path: path.to_path_buf(),
        source,
    })
}
