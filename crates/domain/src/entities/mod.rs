pub mod capture;
pub mod observation;
pub mod position;

// Re-export for easier access
pub use capture::{Capture, CaptureId};
pub use observation::{Observation, ObservationId, PositionFields};
pub use position::{PositionRecord, PositionRowId, StoredPosition};
