//! Spanbook - compile once, query forever
//!
//! Compiles a single source document into a set of immutable,
//! self-describing artifacts and serves deterministic queries over them: a
//! reproducible, static alternative to dynamic retrieval pipelines.
//! Bitwise-identical inputs produce bitwise-identical artifacts and query
//! results, apart from the explicit creation timestamp.
//!
//! ## Features
//!
//! - **Lexical search**: inverted-index AND queries with quoted phrases and
//!   optional edit-distance-1 fuzzy matching
//! - **Ranking**: TF-IDF with phrase boost, or hybrid fusion with a
//!   deterministic hash-projection embedding
//! - **Retrieval packs**: hits expanded to neighbor windows or full
//!   sections, merged, deduplicated and budgeted
//! - **Prompt assembly**: context blocks with superscript citation markers
//!   and a token-headroom budget
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spanbook::{compile_to_dir, create_reader, CompileOptions, RetrieveOptions, PromptRequest};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Build once...
//!     compile_to_dir("guide.md", "artifacts/", &CompileOptions::default())?;
//!
//!     // ...query forever.
//!     let reader = create_reader("artifacts/")?;
//!     let packs = reader.retrieve("lexical index", &RetrieveOptions::default())?;
//!     let prompt = reader.assemble_prompt(&PromptRequest::new("What is the index?", packs));
//!     println!("{}", prompt.user);
//!     Ok(())
//! }
//! ```

pub mod artifact;
pub mod compiler;
pub mod embed;
pub mod loader;
pub mod prompt;
pub mod reader;
pub mod retrieval;
pub mod search;
pub mod text;

// Re-exports for convenience
pub use artifact::{
    Book, BuildReport, DetectionMode, Manifest, NodeMap, Normalization, SchemaVersions, Section,
    Span,
};
pub use compiler::{
    compile, compile_to_dir, CompileError, CompileOptions, CompiledCorpus, Format,
};
pub use embed::{cosine_similarity, embed_text, EmbedError, EMBEDDING_DIMS};
pub use loader::{load_artifacts, ArtifactError, LoadedArtifacts};
pub use prompt::{
    citation_marker, AssembledPrompt, Citation, CitationStyle, PromptRequest, PromptStyle,
    DEFAULT_HEADROOM_TOKENS,
};
pub use reader::{create_reader, NeighborOptions, Reader, SearchOptions};
pub use retrieval::{
    ExpandMode, OrderRange, PackMeta, PackScope, RetrievalPack, RetrievalPackEntry,
    RetrieveOptions,
};
pub use search::{
    FuzzyOptions, HitAnnotations, HybridOptions, PhraseHit, RankMode, SearchError, SearchResult,
    TokenHit, DEFAULT_PHRASE_BOOST, DEFAULT_TF_CACHE_SIZE, PHRASE_BOOST_CAP,
};
pub use text::{normalize_phrase, parse_query, tokenize, ParsedQuery};
