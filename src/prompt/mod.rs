//! Prompt assembly with numeric citation markers
//!
//! Packs are formatted into context blocks in their input order (already
//! ranked by retrieval) and numbered with Unicode superscript markers:
//! `[¹]`, `[²]`, … A character-count proxy stands in for tokens; blocks
//! that would push the user prompt past the configured ceiling minus the
//! reserved headroom are dropped, and since input order is rank order the
//! dropped packs are always the lowest-ranked ones.

use serde::Serialize;

use crate::retrieval::RetrievalPack;

/// Headroom reserved for the model's answer, in estimated tokens.
pub const DEFAULT_HEADROOM_TOKENS: usize = 300;

const QA_SYSTEM_PROMPT: &str = "You answer questions strictly from the provided context blocks. \
Ground every claim in the context and cite the supporting block with its marker. \
If the context does not determine the answer, say that it cannot be answered from the context.";

const SUMMARIZE_SYSTEM_PROMPT: &str = "You summarize the provided context blocks. \
Be concise, cite each statement's source block with its marker, \
and do not add information that is not present in the context.";

const SUPERSCRIPT_DIGITS: [char; 10] =
    ['\u{2070}', '\u{B9}', '\u{B2}', '\u{B3}', '\u{2074}', '\u{2075}', '\u{2076}', '\u{2077}', '\u{2078}', '\u{2079}'];

/// Prompt style, selecting the fixed system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptStyle {
    #[default]
    Qa,
    Summarize,
}

/// Citation marker style. Only numeric superscripts are defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CitationStyle {
    #[default]
    Numeric,
}

/// Input to [`crate::reader::Reader::assemble_prompt`].
#[derive(Debug, Clone)]
pub struct PromptRequest {
    pub question: String,
    pub packs: Vec<RetrievalPack>,
    /// Estimated tokens reserved for the answer.
    pub headroom_tokens: usize,
    pub style: PromptStyle,
    pub citation_style: CitationStyle,
    /// Prompt ceiling; `None` is effectively unbounded. Exists to be
    /// tightened by integrators with real model limits.
    pub max_prompt_tokens: Option<usize>,
}

impl PromptRequest {
    pub fn new(question: impl Into<String>, packs: Vec<RetrievalPack>) -> Self {
        Self {
            question: question.into(),
            packs,
            headroom_tokens: DEFAULT_HEADROOM_TOKENS,
            style: PromptStyle::default(),
            citation_style: CitationStyle::default(),
            max_prompt_tokens: None,
        }
    }

    pub fn with_style(mut self, style: PromptStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_headroom(mut self, headroom_tokens: usize) -> Self {
        self.headroom_tokens = headroom_tokens;
        self
    }

    pub fn with_max_prompt_tokens(mut self, ceiling: usize) -> Self {
        self.max_prompt_tokens = Some(ceiling);
        self
    }
}

/// One accepted pack's citation record, in marker order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    /// `[¹]`, `[²]`, …
    pub marker: String,
    pub pack_id: String,
    pub doc_id: String,
    pub heading_path: Vec<String>,
    /// Phrase match offsets from the pack's entry, when any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_offsets: Option<Vec<(usize, usize)>>,
}

/// A fully assembled prompt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembledPrompt {
    pub system: String,
    pub user: String,
    pub citations: Vec<Citation>,
    /// Character-count proxy for the user prompt size.
    pub tokens_estimated: usize,
}

/// Citation marker for a 1-based pack number.
pub fn citation_marker(number: usize) -> String {
    let digits: String = number
        .to_string()
        .chars()
        .map(|d| SUPERSCRIPT_DIGITS[d as usize - '0' as usize])
        .collect();
    format!("[{digits}]")
}

/// Assemble the prompt. The caller (the reader) supplies the document id.
pub fn assemble_prompt(request: &PromptRequest, doc_id: &str) -> AssembledPrompt {
    let system = match request.style {
        PromptStyle::Qa => QA_SYSTEM_PROMPT,
        PromptStyle::Summarize => SUMMARIZE_SYSTEM_PROMPT,
    }
    .to_string();

    // Fixed part of the user prompt: question, blank line, reference line
    // sized for the full candidate set.
    let base_size = request.question.chars().count()
        + 2
        + reference_line(request.packs.len()).chars().count();
    let budget = request
        .max_prompt_tokens
        .map(|ceiling| ceiling.saturating_sub(request.headroom_tokens));

    let mut blocks = Vec::new();
    let mut citations = Vec::new();
    let mut total_chars = 0usize;
    for (index, pack) in request.packs.iter().enumerate() {
        let marker = citation_marker(index + 1);
        let block = format_block(&marker, doc_id, pack);
        let block_size = block.chars().count() + 2;
        if let Some(budget) = budget {
            if base_size + total_chars + block_size > budget {
                break;
            }
        }
        total_chars += block_size;
        citations.push(Citation {
            marker,
            pack_id: pack.pack_id.clone(),
            doc_id: doc_id.to_string(),
            heading_path: pack.meta.heading_path.clone(),
            span_offsets: phrase_offsets(pack),
        });
        blocks.push(block);
    }

    let user = if blocks.is_empty() {
        request.question.clone()
    } else {
        let mut user = String::new();
        user.push_str(&request.question);
        user.push_str("\n\n");
        user.push_str(&reference_line(blocks.len()));
        for block in &blocks {
            user.push_str("\n\n");
            user.push_str(block);
        }
        user
    };

    let tokens_estimated = user.chars().count();
    tracing::trace!(
        packs = request.packs.len(),
        accepted = citations.len(),
        tokens_estimated,
        "prompt assembled"
    );

    AssembledPrompt {
        system,
        user,
        citations,
        tokens_estimated,
    }
}

fn reference_line(pack_count: usize) -> String {
    format!(
        "You may reference {}\u{2026}{}.",
        citation_marker(1),
        citation_marker(pack_count.max(1))
    )
}

fn format_block(marker: &str, doc_id: &str, pack: &RetrievalPack) -> String {
    let mut block = String::new();
    block.push_str(marker);
    block.push('\n');
    block.push_str("Doc: ");
    block.push_str(doc_id);
    block.push('\n');
    if !pack.meta.heading_path.is_empty() {
        block.push_str("Path: ");
        block.push_str(&pack.meta.heading_path.join(" > "));
        block.push('\n');
    }
    block.push_str("---\n");
    block.push_str(&pack.text);
    block
}

fn phrase_offsets(pack: &RetrievalPack) -> Option<Vec<(usize, usize)>> {
    let offsets: Vec<(usize, usize)> = pack
        .entry
        .hits
        .phrases
        .iter()
        .flat_map(|phrase| phrase.ranges.iter().copied())
        .collect();
    if offsets.is_empty() {
        None
    } else {
        Some(offsets)
    }
}
