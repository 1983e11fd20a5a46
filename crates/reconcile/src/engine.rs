use crate::cache::PositionCache;
use crate::config::EngineConfig;
use crate::ingest::{CapturePipeline, CaptureWriter, TextExtractor};
use crate::qc::QualityControl;
use lpscope_data::PositionStore;
use lpscope_domain::Clock;
use std::sync::Arc;

/// The engine components built over one store.
///
/// The cache, writer and QC driver share the same store and cache instance,
/// so every write and every fix invalidates what readers see.
pub struct Engine {
    store: Arc<dyn PositionStore>,
    cache: Arc<PositionCache>,
    writer: Arc<CaptureWriter>,
    qc: Arc<QualityControl>,
}

impl Engine {
    pub fn new(store: Arc<dyn PositionStore>, clock: Arc<dyn Clock>, config: EngineConfig) -> Self {
        let cache = Arc::new(PositionCache::new(
            Arc::clone(&store),
            clock,
            config.cache,
            config.retry.clone(),
        ));
        let writer = Arc::new(CaptureWriter::new(
            Arc::clone(&store),
            Arc::clone(&cache),
            config.retry.clone(),
        ));
        let qc = Arc::new(QualityControl::new(
            Arc::clone(&store),
            Arc::clone(&cache),
            config.retry,
        ));

        Self {
            store,
            cache,
            writer,
            qc,
        }
    }

    pub fn store(&self) -> &Arc<dyn PositionStore> {
        &self.store
    }

    /// The read side consumers query.
    pub fn cache(&self) -> &Arc<PositionCache> {
        &self.cache
    }

    pub fn writer(&self) -> &Arc<CaptureWriter> {
        &self.writer
    }

    pub fn qc(&self) -> &Arc<QualityControl> {
        &self.qc
    }

    /// A capture pipeline over this engine's writer and QC driver.
    pub fn pipeline(&self, text: Arc<dyn TextExtractor>) -> CapturePipeline {
        CapturePipeline::new(text, Arc::clone(&self.writer), Arc::clone(&self.qc))
    }
}
