//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use lpscope_reconcile::prelude::*;
//! ```

// Cache
pub use crate::cache::{CacheStats, PositionCache};

// Config
pub use crate::config::{CacheConfig, EngineConfig};

// Engine
pub use crate::engine::Engine;
pub use crate::error::{EngineError, EngineResult};

// Ingest
pub use crate::ingest::{
    CaptureOutcome, CapturePipeline, CaptureWriter, DroppedObservation, IngestReport,
    TextExtractor, VisionExtractor, WriteFailure,
};

// Matching
pub use crate::matching::{
    MAX_FUZZY_DISTANCE, MatchKind, PairMatch, PairMatcher, canonical_symbol, levenshtein, normalize,
};

// Merge
pub use crate::merge::{Ranked, RecordMerger};

// Quality control
pub use crate::qc::{
    CaptureLocks, FixOutcome, FixResult, IssueType, PositionRef, QcIssue, QcReport,
    QualityControl, ValidationIssue, ValidationReport, apply_fixes, apply_patch, detect,
    detect_position, plan_fixes, validate,
};
