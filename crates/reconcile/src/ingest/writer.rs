use crate::cache::PositionCache;
use crate::error::{EngineError, EngineResult};
use crate::matching::{MatchKind, PairMatcher};
use lpscope_data::{PositionQuery, PositionStore, RetryPolicy, StoreError, StoreResult};
use lpscope_domain::{CanonicalKey, Capture, CaptureId, Observation, StoredPosition};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// An observation that was not written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedObservation {
    pub protocol: String,
    pub raw_pair_label: String,
    pub reason: String,
}

/// A write the store rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteFailure {
    pub raw_pair_label: String,
    pub error: String,
}

/// Result of writing one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub capture_id: CaptureId,
    /// Observations that reached the store.
    pub attempted: usize,
    pub saved: usize,
    pub dropped: Vec<DroppedObservation>,
    pub failures: Vec<WriteFailure>,
}

impl IngestReport {
    fn new(capture_id: CaptureId) -> Self {
        Self {
            capture_id,
            attempted: 0,
            saved: 0,
            dropped: Vec::new(),
            failures: Vec::new(),
        }
    }

    fn drop_observation(&mut self, observation: &Observation, reason: impl Into<String>) {
        self.dropped.push(DroppedObservation {
            protocol: observation.protocol.clone(),
            raw_pair_label: observation.raw_pair_label.clone(),
            reason: reason.into(),
        });
    }

    /// Every observation was saved.
    pub fn is_clean(&self) -> bool {
        self.dropped.is_empty() && self.failures.is_empty()
    }
}

/// Writes extractor batches and keeps the cache coherent with them.
pub struct CaptureWriter {
    store: Arc<dyn PositionStore>,
    cache: Arc<PositionCache>,
    matcher: PairMatcher,
    retry: RetryPolicy,
}

impl CaptureWriter {
    pub fn new(store: Arc<dyn PositionStore>, cache: Arc<PositionCache>, retry: RetryPolicy) -> Self {
        Self {
            store,
            cache,
            matcher: PairMatcher::new(),
            retry,
        }
    }

    /// Persists `capture` and one row per text observation.
    ///
    /// Rows are keyed by protocol and normalized pair label. An observation
    /// without a protocol takes the capture's. Each row is written on its
    /// own; a rejected write is reported and the rest carry on.
    ///
    /// # Errors
    /// Returns the store error if the capture itself cannot be inserted.
    pub async fn write_text_batch(
        &self,
        capture: &Capture,
        observations: &[Observation],
    ) -> EngineResult<IngestReport> {
        self.retry
            .run("insert_capture", || self.store.insert_capture(capture))
            .await?;

        let mut report = IngestReport::new(capture.id);
        for observation in observations {
            if observation.raw_pair_label.trim().is_empty() {
                report.drop_observation(observation, "blank pair label");
                continue;
            }

            let mut observation = observation.clone();
            if observation.protocol.trim().is_empty() {
                match capture.protocol_name() {
                    Some(protocol) => observation.protocol = protocol.to_string(),
                    None => {
                        report.drop_observation(&observation, "no protocol");
                        continue;
                    }
                }
            }

            let pair = self.matcher.normalize(&observation.raw_pair_label);
            let key = CanonicalKey::new(&observation.protocol, pair);
            self.write(&mut report, StoredPosition::new(capture.id, key, observation))
                .await;
        }

        info!(
            capture_id = %capture.id,
            attempted = report.attempted,
            saved = report.saved,
            dropped = report.dropped.len(),
            failed = report.failures.len(),
            "Wrote text batch"
        );
        Ok(report)
    }

    /// Writes vision observations under the pair labels already stored for
    /// the capture.
    ///
    /// Each observation is matched against the stored pairs of the same
    /// protocol. An observation without a protocol takes the capture's.
    /// Unmatched observations are dropped, never written under a new key.
    ///
    /// # Errors
    /// Returns the store error if the capture or its rows cannot be read.
    pub async fn write_vision_batch(
        &self,
        capture_id: CaptureId,
        observations: Vec<Observation>,
    ) -> EngineResult<IngestReport> {
        let query = PositionQuery::for_capture(capture_id);
        let existing = self
            .retry
            .run("select_positions", || self.store.select_positions(&query))
            .await?;
        let candidates = candidates_by_protocol(&existing);
        let capture = self
            .retry
            .run("find_capture", || self.store.find_capture(capture_id))
            .await?;
        let fallback_protocol = capture.as_ref().and_then(Capture::protocol_name);

        let mut report = IngestReport::new(capture_id);
        for mut observation in observations {
            if observation.protocol.trim().is_empty() {
                match fallback_protocol {
                    Some(protocol) => observation.protocol = protocol.to_string(),
                    None => {
                        report.drop_observation(&observation, "no protocol");
                        continue;
                    }
                }
            }
            let protocol = CanonicalKey::fold_protocol(&observation.protocol);
            let known = candidates.get(&protocol).map(Vec::as_slice).unwrap_or_default();

            let matched = match self.matcher.resolve(&observation.raw_pair_label, known) {
                Ok(matched) => matched,
                Err(err @ EngineError::UnresolvedMatch { .. }) => {
                    warn!(
                        capture_id = %capture_id,
                        protocol = %observation.protocol,
                        label = %observation.raw_pair_label,
                        "Dropping unresolved vision observation"
                    );
                    report.drop_observation(&observation, err.to_string());
                    continue;
                }
                Err(err) => return Err(err),
            };

            debug!(
                label = %observation.raw_pair_label,
                candidate = %matched.candidate,
                kind = ?matched.kind,
                "Resolved vision observation"
            );
            if matched.kind == MatchKind::Reversed {
                swap_sides(&mut observation);
            }
            let key = CanonicalKey::new(&protocol, matched.candidate);
            self.write(&mut report, StoredPosition::new(capture_id, key, observation))
                .await;
        }

        info!(
            capture_id = %capture_id,
            attempted = report.attempted,
            saved = report.saved,
            dropped = report.dropped.len(),
            failed = report.failures.len(),
            "Wrote vision batch"
        );
        Ok(report)
    }

    async fn write(&self, report: &mut IngestReport, row: StoredPosition) {
        report.attempted += 1;
        let result = match self
            .retry
            .run("insert_position", || self.store.insert_position(&row))
            .await
        {
            Err(err) => self.confirm_insert(&row, err).await,
            ok => ok,
        };
        // A failed insert may still have committed.
        self.cache.invalidate(&row.key).await;

        match result {
            Ok(()) => {
                report.saved += 1;
                debug!(row = %row.id, key = %row.key, "Saved position");
            }
            Err(err) => {
                warn!(key = %row.key, error = %err, "Failed to save position");
                report.failures.push(WriteFailure {
                    raw_pair_label: row.observation.raw_pair_label.clone(),
                    error: err.to_string(),
                });
            }
        }
    }

    /// Keeps `err` unless the row is readable from the store anyway.
    ///
    /// An attempt that times out after its commit makes the retry fail on the
    /// duplicate id.
    async fn confirm_insert(&self, row: &StoredPosition, err: StoreError) -> StoreResult<()> {
        let query = PositionQuery::for_capture(row.capture_id).with_key(row.key.clone());
        match self
            .retry
            .run("select_positions", || self.store.select_positions(&query))
            .await
        {
            Ok(rows) if rows.iter().any(|stored| stored.id == row.id) => {
                warn!(row = %row.id, error = %err, "Insert reported failure but the row is stored");
                Ok(())
            }
            _ => Err(err),
        }
    }
}

/// Re-orients a reversed observation to the stored pair's token order.
///
/// Prices are quoted in the other token, so the range and current price are
/// inverted. A zero bound or price is cleared.
fn swap_sides(observation: &mut Observation) {
    std::mem::swap(&mut observation.token0, &mut observation.token1);
    let fields = &mut observation.fields;
    std::mem::swap(&mut fields.token0_amount, &mut fields.token1_amount);
    std::mem::swap(&mut fields.token0_value, &mut fields.token1_value);
    std::mem::swap(&mut fields.token0_percentage, &mut fields.token1_percentage);

    let (min, max) = (fields.range_min.take(), fields.range_max.take());
    fields.range_min = max.and_then(invert);
    fields.range_max = min.and_then(invert);
    fields.current_price = fields.current_price.and_then(invert);
}

fn invert(price: Decimal) -> Option<Decimal> {
    Decimal::ONE.checked_div(price)
}

/// Stored pair labels per folded protocol, deduplicated in first-seen order.
fn candidates_by_protocol(rows: &[StoredPosition]) -> HashMap<String, Vec<String>> {
    let mut candidates: HashMap<String, Vec<String>> = HashMap::new();
    for row in rows {
        let pairs = candidates.entry(row.key.protocol().to_string()).or_default();
        if !pairs.iter().any(|p| p == row.key.pair()) {
            pairs.push(row.key.pair().to_string());
        }
    }
    candidates
}
