use thiserror::Error;

/// Errors raised while parsing domain values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A section name that is not one of the known dashboard sections.
    #[error("unknown section: {0}")]
    UnknownSection(String),
    /// A source name that is not one of the known extractors.
    #[error("unknown source: {0}")]
    UnknownSource(String),
}
