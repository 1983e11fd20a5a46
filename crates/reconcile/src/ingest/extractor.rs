use crate::error::EngineResult;
use async_trait::async_trait;
use lpscope_domain::{Capture, Observation};

/// Pattern-based extractor run over the page snapshot.
pub trait TextExtractor: Send + Sync {
    /// Returns every position recognized on the page, possibly none.
    fn extract(&self, capture: &Capture) -> Vec<Observation>;
}

/// Vision-model extractor run over the page screenshot.
///
/// Called at most once per capture. `context` is the text extractor's
/// output for the same page.
#[async_trait]
pub trait VisionExtractor: Send + Sync {
    async fn extract(&self, image: &[u8], context: &[Observation]) -> EngineResult<Vec<Observation>>;
}
