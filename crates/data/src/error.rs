use std::time::Duration;
use thiserror::Error;

/// Result alias for store calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failure of a store call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The caller-supplied timeout elapsed.
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),
    /// Network or availability problem; safe to retry.
    #[error("transient store failure: {0}")]
    Transient(String),
    /// Malformed request or schema violation; retrying cannot help.
    #[error("store rejected request: {0}")]
    Fatal(String),
    /// A referenced row does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Table or entity name.
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },
}

impl StoreError {
    /// Whether retrying the call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Timeout(_) | StoreError::Transient(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Transient(err.to_string()),
            other => StoreError::Fatal(other.to_string()),
        }
    }
}
