//! Position reconciliation and consistency engine.
//!
//! This crate turns partial, out-of-order observations from two extractors
//! into one surfaced record per logical position:
//! - Pair label normalization and matching across sources
//! - Best-record selection per canonical key
//! - A read-optimized cache with per-key invalidation
//! - A four-stage quality-control sweep per capture
//! - Capture ingestion that never writes an unresolved observation

/// Prelude module for convenient imports.
pub mod prelude;

/// Read-optimized position cache.
pub mod cache;
/// Engine configuration.
pub mod config;
/// Wiring of the engine components.
pub mod engine;
/// Error types.
pub mod error;
/// Capture ingestion and extractor seams.
pub mod ingest;
/// Pair label normalization and matching.
pub mod matching;
/// Best-record selection.
pub mod merge;
/// Quality-control sweep.
pub mod qc;

#[cfg(test)]
pub(crate) mod test_support;

pub use engine::Engine;
pub use error::{EngineError, EngineResult};
