//! Writing extractor output into the store.

mod extractor;
mod pipeline;
mod writer;

pub use extractor::{TextExtractor, VisionExtractor};
pub use pipeline::{CaptureOutcome, CapturePipeline};
pub use writer::{CaptureWriter, DroppedObservation, IngestReport, WriteFailure};
