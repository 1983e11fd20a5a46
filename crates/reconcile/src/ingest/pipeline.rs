use super::extractor::{TextExtractor, VisionExtractor};
use super::writer::{CaptureWriter, IngestReport};
use crate::error::EngineResult;
use crate::qc::{QcReport, QualityControl};
use lpscope_domain::Capture;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// Everything that happened to one capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureOutcome {
    pub text: IngestReport,
    /// Present when the vision pass ran and its batch was written.
    pub vision: Option<IngestReport>,
    pub vision_error: Option<String>,
    pub qc: QcReport,
}

/// Text extraction, vision extraction and the QC sweep for one capture.
pub struct CapturePipeline {
    text: Arc<dyn TextExtractor>,
    vision: Option<Arc<dyn VisionExtractor>>,
    writer: Arc<CaptureWriter>,
    qc: Arc<QualityControl>,
}

impl CapturePipeline {
    pub fn new(
        text: Arc<dyn TextExtractor>,
        writer: Arc<CaptureWriter>,
        qc: Arc<QualityControl>,
    ) -> Self {
        Self {
            text,
            vision: None,
            writer,
            qc,
        }
    }

    #[must_use]
    pub fn with_vision(mut self, vision: Arc<dyn VisionExtractor>) -> Self {
        self.vision = Some(vision);
        self
    }

    /// Processes one captured page.
    ///
    /// The vision extractor only runs when the capture carries an image. A
    /// failure in the vision pass is logged and recorded in the outcome.
    ///
    /// # Errors
    /// Returns the store error when the text batch or the QC sweep fails.
    pub async fn process(&self, capture: &Capture) -> EngineResult<CaptureOutcome> {
        let observations = self.text.extract(capture);
        let text = self.writer.write_text_batch(capture, &observations).await?;

        let mut vision = None;
        let mut vision_error = None;
        if let (Some(extractor), Some(image)) = (&self.vision, capture.image.as_deref()) {
            if !image.is_empty() {
                let written = match extractor.extract(image, &observations).await {
                    Ok(found) => self.writer.write_vision_batch(capture.id, found).await,
                    Err(err) => Err(err),
                };
                match written {
                    Ok(report) => vision = Some(report),
                    Err(err) => {
                        warn!(capture_id = %capture.id, error = %err, "Vision pass failed");
                        vision_error = Some(err.to_string());
                    }
                }
            }
        }

        let qc = self.qc.run(capture.id).await?;
        Ok(CaptureOutcome {
            text,
            vision,
            vision_error,
            qc,
        })
    }
}
