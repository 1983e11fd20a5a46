//! Per-key selection of the best observation.

mod merger;

pub use merger::{Ranked, RecordMerger};
