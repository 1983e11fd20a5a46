//! Domain model for scraped DeFi portfolio positions.
//!
//! This crate holds the types shared by the store and the reconciliation
//! engine:
//! - Observations produced by the text and vision extractors
//! - Capture envelopes and persisted position rows
//! - Canonical keys and token pair labels
//! - Sections, sources and issue severities

/// Time source abstraction.
pub mod clock;
/// Core entities.
pub mod entities;
/// Shared enumerations.
pub mod enums;
/// Domain errors.
pub mod error;
/// Value objects.
pub mod value_objects;

pub use clock::{Clock, FixedClock, SystemClock};
pub use entities::{
    Capture, CaptureId, Observation, ObservationId, PositionFields, PositionRecord,
    PositionRowId, StoredPosition,
};
pub use enums::{Section, Severity, SourceKind};
pub use error::DomainError;
pub use value_objects::{CanonicalKey, Percentage, PriceRange, TokenPair};
