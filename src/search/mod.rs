//! Lexical index and rankers
//!
//! Three stages, composed by the reader:
//!
//! ```text
//! Query
//!   │
//!   ▼
//! ┌─────────────────┐   candidates    ┌──────────────┐
//! │  LexicalIndex   │ ──────────────▶ │  TfIdfRanker │
//! │  (AND + fuzzy)  │                 └──────┬───────┘
//! └─────────────────┘                        │ scores
//!                                            ▼
//!                                    ┌──────────────┐
//!                                    │ HybridRanker │ ◀── query embedding
//!                                    └──────────────┘
//! ```
//!
//! The index finds every span matching all query tokens and phrases and
//! annotates how each matched; the rankers only rewrite scores. Sorting and
//! truncation happen in the reader, so every stage stays order-preserving
//! and deterministic.

pub mod hybrid;
pub mod lexical;
pub mod tfidf;
pub mod types;

pub use hybrid::HybridRanker;
pub use lexical::LexicalIndex;
pub use tfidf::{TfIdfRanker, DEFAULT_TF_CACHE_SIZE};
pub use types::{
    FuzzyOptions, HitAnnotations, HybridOptions, PhraseHit, RankMode, SearchError, SearchResult,
    TokenHit, DEFAULT_PHRASE_BOOST, PHRASE_BOOST_CAP,
};
