use lpscope_data::StoreError;
use thiserror::Error;

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A store call failed after retries, or was rejected.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// No candidate pair label was acceptable for an observation.
    #[error("no candidate matches pair label {label:?}")]
    UnresolvedMatch {
        /// The label as extracted.
        label: String,
    },
    /// The vision extractor failed.
    #[error("vision extraction failed: {0}")]
    Vision(String),
}

impl EngineError {
    /// Whether the failure is worth retrying later.
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::Store(err) if err.is_transient())
    }
}
