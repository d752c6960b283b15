//! Document structure: heading paths and the node map
//!
//! Markdown fragments are classified as H1/H2/H3 headings or paragraphs. A
//! three-level heading-path builder assigns each span its ancestor headings:
//! a heading span carries the *parent* path (the path above its own level),
//! every other span carries the full current path.
//!
//! The node map places every span in exactly one section: chapters per H1,
//! sections per H2, with synthetic sections inserted wherever content
//! precedes the first H2 of a chapter (the H1 span itself included) and a
//! synthetic chapter when content precedes the first H1. A document with no
//! H1/H2 at all collapses to one synthetic chapter holding one synthetic
//! section whose heading is the document title.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::artifact::{Section, Span};

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,3})\s+(.+)$").expect("heading pattern"));

/// Structure extracted from the fragment list. `Span.embedding` is left
/// absent here; the compiler fills it in afterwards.
pub(crate) struct DocumentStructure {
    pub spans: Vec<Span>,
    pub chapters: BTreeMap<String, Vec<String>>,
    pub sections: BTreeMap<String, Section>,
    pub paragraphs: BTreeMap<String, String>,
}

/// A fragment that is a single-line H1/H2/H3 heading.
pub(crate) fn heading_of(fragment: &str) -> Option<(usize, &str)> {
    if fragment.contains('\n') {
        return None;
    }
    let captures = HEADING_RE.captures(fragment)?;
    let level = captures.get(1).map_or(0, |m| m.as_str().len());
    let text = captures.get(2).map_or("", |m| m.as_str());
    Some((level, text))
}

/// The display text of the first H1, used as the document title.
pub(crate) fn first_h1(fragments: &[&str]) -> Option<String> {
    fragments
        .iter()
        .filter_map(|f| heading_of(f))
        .find(|&(level, _)| level == 1)
        .map(|(_, text)| text.to_string())
}

fn span_id(index: usize) -> String {
    format!("span:{:06}", index + 1)
}

/// Incremental chapter/section assignment.
struct NodeMapBuilder {
    chapters: BTreeMap<String, Vec<String>>,
    sections: BTreeMap<String, Section>,
    paragraphs: BTreeMap<String, String>,
    current_chapter: Option<String>,
    current_section: Option<String>,
    chapter_seq: usize,
    section_seq: usize,
}

impl NodeMapBuilder {
    fn new() -> Self {
        Self {
            chapters: BTreeMap::new(),
            sections: BTreeMap::new(),
            paragraphs: BTreeMap::new(),
            current_chapter: None,
            current_section: None,
            chapter_seq: 0,
            section_seq: 0,
        }
    }

    fn open_chapter(&mut self) -> String {
        self.chapter_seq += 1;
        let id = format!("chap:{:06}", self.chapter_seq);
        self.chapters.insert(id.clone(), Vec::new());
        self.current_chapter = Some(id.clone());
        self.current_section = None;
        id
    }

    fn open_section(&mut self, heading: String) -> String {
        let chapter = match &self.current_chapter {
            Some(id) => id.clone(),
            None => self.open_chapter(),
        };
        self.section_seq += 1;
        let id = format!("sec:{:06}", self.section_seq);
        self.sections.insert(
            id.clone(),
            Section {
                paragraph_ids: Vec::new(),
                heading,
            },
        );
        self.chapters
            .get_mut(&chapter)
            .expect("current chapter exists")
            .push(id.clone());
        self.current_section = Some(id.clone());
        id
    }

    /// Assign a span to the current section, opening a synthetic one first
    /// when the chapter has no section yet.
    fn assign(&mut self, span_id: &str, synthetic_heading: &str) {
        if self.current_section.is_none() {
            self.open_section(synthetic_heading.to_string());
        }
        let section_id = self.current_section.clone().expect("section just opened");
        self.sections
            .get_mut(&section_id)
            .expect("current section exists")
            .paragraph_ids
            .push(span_id.to_string());
        self.paragraphs.insert(span_id.to_string(), section_id);
    }
}

/// Build spans and the node map for a Markdown document.
pub(crate) fn markdown_structure(fragments: &[&str], title: &str) -> DocumentStructure {
    let mut builder = NodeMapBuilder::new();
    let mut path: [Option<String>; 3] = [None, None, None];
    let mut spans = Vec::with_capacity(fragments.len());

    for (index, fragment) in fragments.iter().enumerate() {
        let id = span_id(index);
        let heading_path;

        match heading_of(fragment) {
            Some((level, display)) => {
                // Parent path: everything above this heading's level.
                heading_path = path[..level - 1]
                    .iter()
                    .flatten()
                    .cloned()
                    .collect::<Vec<_>>();
                path[level - 1] = Some(display.to_string());
                for deeper in path[level..].iter_mut() {
                    *deeper = None;
                }

                match level {
                    1 => {
                        builder.open_chapter();
                        builder.assign(&id, display);
                    }
                    2 => {
                        builder.open_section(fragment.to_string());
                        builder.assign(&id, fragment);
                    }
                    _ => {
                        let synthetic = synthetic_heading(&path, title);
                        builder.assign(&id, &synthetic);
                    }
                }
            }
            None => {
                heading_path = path.iter().flatten().cloned().collect();
                let synthetic = synthetic_heading(&path, title);
                builder.assign(&id, &synthetic);
            }
        }

        spans.push(Span {
            id,
            text: fragment.to_string(),
            order: index as u32,
            heading_path,
            embedding: None,
        });
    }

    DocumentStructure {
        spans,
        chapters: builder.chapters,
        sections: builder.sections,
        paragraphs: builder.paragraphs,
    }
}

/// Heading for a synthetic section: the owning chapter's H1 display text
/// when one exists, else the document title. Never starts with `#`, which
/// is how consumers recognize synthetic sections.
fn synthetic_heading(path: &[Option<String>; 3], title: &str) -> String {
    path[0].clone().unwrap_or_else(|| title.to_string())
}

/// Build spans and the trivial node map for a plain-text document: one
/// synthetic chapter, one synthetic section headed by the title.
pub(crate) fn plain_text_structure(fragments: &[&str], title: &str) -> DocumentStructure {
    let mut builder = NodeMapBuilder::new();
    let mut spans = Vec::with_capacity(fragments.len());

    for (index, fragment) in fragments.iter().enumerate() {
        let id = span_id(index);
        builder.assign(&id, title);
        spans.push(Span {
            id,
            text: fragment.to_string(),
            order: index as u32,
            heading_path: Vec::new(),
            embedding: None,
        });
    }

    DocumentStructure {
        spans,
        chapters: builder.chapters,
        sections: builder.sections,
        paragraphs: builder.paragraphs,
    }
}
