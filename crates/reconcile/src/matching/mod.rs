//! Pair label normalization and cross-source matching.
//!
//! Both extractors label the same position differently: OCR swaps letters,
//! the DOM scraper leaves a trailing `0` from an adjacent cell, one source
//! shows `WETH` where the other shows `ETH`. Labels are normalized before
//! any comparison, and an observation that matches no known label is never
//! attached to one.

mod matcher;
mod normalize;

pub use matcher::{MAX_FUZZY_DISTANCE, MatchKind, PairMatch, PairMatcher, levenshtein};
pub use normalize::{canonical_symbol, normalize};
