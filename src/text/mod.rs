//! Text normalization primitives shared by the build pipeline and the query path
//!
//! Everything downstream of this module (the inverted index, the rankers, the
//! phrase matcher) assumes the exact normalization rules defined here, so the
//! build side and the query side can never disagree about what a token is.

pub mod fuzzy;
pub mod phrase;
pub mod tokenizer;

pub use fuzzy::{fuzzy_candidates, one_edit_neighborhood};
pub use phrase::{
    contains_all_phrases, find_phrase_matches, normalize_phrase, parse_query, ParsedQuery,
};
pub use tokenizer::tokenize;
