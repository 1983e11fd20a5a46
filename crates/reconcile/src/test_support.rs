//! Fixtures and store doubles shared by the unit tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use lpscope_data::{
    MemoryStore, PositionPatch, PositionQuery, PositionStore, RetryPolicy, StoreError, StoreResult,
};
use lpscope_domain::{
    CanonicalKey, Capture, CaptureId, Observation, PositionFields, PositionRowId, Section,
    SourceKind, StoredPosition,
};
use rust_decimal_macros::dec;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

/// Minutes after a fixed base instant.
pub(crate) fn ts(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() + ChronoDuration::minutes(minutes)
}

/// A text-pattern observation filed under the protocol's known section.
pub(crate) fn obs(protocol: &str, label: &str, at: DateTime<Utc>) -> Observation {
    let section = Section::for_protocol(protocol).unwrap_or(Section::Liquidity);
    Observation::new(protocol, label, at, section, SourceKind::TextPattern)
}

/// A fully populated, internally consistent token breakdown.
pub(crate) fn complete_fields() -> PositionFields {
    PositionFields {
        balance: Some(dec!(1000)),
        pending_yield: Some(dec!(2.5)),
        apy: Some(dec!(18.4)),
        range_min: Some(dec!(90)),
        range_max: Some(dec!(110)),
        current_price: Some(dec!(100)),
        token0_amount: Some(dec!(6)),
        token1_amount: Some(dec!(400)),
        token0_value: Some(dec!(600)),
        token1_value: Some(dec!(400)),
        token0_percentage: Some(dec!(60)),
        token1_percentage: Some(dec!(40)),
    }
}

pub(crate) fn key(protocol: &str, pair: &str) -> CanonicalKey {
    CanonicalKey::new(protocol, pair)
}

/// A row under a fresh capture id.
pub(crate) fn stored(protocol: &str, pair: &str, observation: Observation) -> StoredPosition {
    StoredPosition::new(CaptureId::new(), key(protocol, pair), observation)
}

pub(crate) fn capture(protocol: &str) -> Capture {
    Capture::new(protocol, ts(0), serde_json::json!({ "text": "Positions" }))
}

/// Short timeouts and backoff so failing tests finish quickly.
pub(crate) fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        timeout: Duration::from_millis(50),
        max_attempts: 2,
        base_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(2),
    }
}

/// Inserts `capture` and `rows` (re-homed under the capture).
pub(crate) async fn seed(
    store: &dyn PositionStore,
    capture: &Capture,
    rows: Vec<StoredPosition>,
) -> Vec<StoredPosition> {
    store.insert_capture(capture).await.unwrap();
    let mut seeded = Vec::with_capacity(rows.len());
    for mut row in rows {
        row.capture_id = capture.id;
        store.insert_position(&row).await.unwrap();
        seeded.push(row);
    }
    seeded
}

/// [`MemoryStore`] with injectable failures.
#[derive(Debug, Default)]
pub(crate) struct FlakyStore {
    pub(crate) inner: MemoryStore,
    /// Upcoming `select_positions` calls that fail transiently.
    pub(crate) failing_selects: AtomicU32,
    /// Make every `select_positions` outlast any test timeout.
    pub(crate) hang_selects: AtomicBool,
    pub(crate) select_calls: AtomicU32,
    /// Rows whose updates fail fatally.
    pub(crate) failing_updates: Mutex<HashSet<PositionRowId>>,
    /// Raw labels whose inserts fail fatally.
    pub(crate) failing_labels: Mutex<HashSet<String>>,
    /// The next insert commits, then outlasts any test timeout.
    stall_next_insert: AtomicBool,
}

impl FlakyStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail_next_selects(&self, count: u32) {
        self.failing_selects.store(count, Ordering::SeqCst);
    }

    pub(crate) fn fail_update(&self, id: PositionRowId) {
        self.failing_updates.lock().unwrap().insert(id);
    }

    pub(crate) fn fail_label(&self, label: &str) {
        self.failing_labels.lock().unwrap().insert(label.to_string());
    }

    pub(crate) fn stall_after_next_insert(&self) {
        self.stall_next_insert.store(true, Ordering::SeqCst);
    }

    pub(crate) fn selects(&self) -> u32 {
        self.select_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PositionStore for FlakyStore {
    async fn insert_capture(&self, capture: &Capture) -> StoreResult<()> {
        self.inner.insert_capture(capture).await
    }

    async fn find_capture(&self, id: CaptureId) -> StoreResult<Option<Capture>> {
        self.inner.find_capture(id).await
    }

    async fn recent_captures(&self, limit: usize) -> StoreResult<Vec<Capture>> {
        self.inner.recent_captures(limit).await
    }

    async fn delete_capture(&self, id: CaptureId) -> StoreResult<bool> {
        self.inner.delete_capture(id).await
    }

    async fn insert_position(&self, position: &StoredPosition) -> StoreResult<()> {
        let fails = self
            .failing_labels
            .lock()
            .unwrap()
            .contains(&position.observation.raw_pair_label);
        if fails {
            return Err(StoreError::Fatal("insert rejected".into()));
        }
        self.inner.insert_position(position).await?;
        if self.stall_next_insert.swap(false, Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        Ok(())
    }

    async fn update_position(&self, id: PositionRowId, patch: &PositionPatch) -> StoreResult<bool> {
        let fails = self.failing_updates.lock().unwrap().contains(&id);
        if fails {
            return Err(StoreError::Fatal("update rejected".into()));
        }
        self.inner.update_position(id, patch).await
    }

    async fn select_positions(&self, query: &PositionQuery) -> StoreResult<Vec<StoredPosition>> {
        self.select_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang_selects.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        let failing = self
            .failing_selects
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(StoreError::Transient("connection reset".into()));
        }
        self.inner.select_positions(query).await
    }

    async fn delete_positions(&self, query: &PositionQuery) -> StoreResult<u64> {
        self.inner.delete_positions(query).await
    }
}

/// [`MemoryStore`] that, once armed, holds the result of the next
/// `select_positions` until released.
#[derive(Debug, Default)]
pub(crate) struct GatedStore {
    pub(crate) inner: MemoryStore,
    armed: AtomicBool,
    /// Signalled once the gated select has read its rows.
    pub(crate) entered: Notify,
    release: Notify,
}

impl GatedStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    pub(crate) fn release(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl PositionStore for GatedStore {
    async fn insert_capture(&self, capture: &Capture) -> StoreResult<()> {
        self.inner.insert_capture(capture).await
    }

    async fn find_capture(&self, id: CaptureId) -> StoreResult<Option<Capture>> {
        self.inner.find_capture(id).await
    }

    async fn recent_captures(&self, limit: usize) -> StoreResult<Vec<Capture>> {
        self.inner.recent_captures(limit).await
    }

    async fn delete_capture(&self, id: CaptureId) -> StoreResult<bool> {
        self.inner.delete_capture(id).await
    }

    async fn insert_position(&self, position: &StoredPosition) -> StoreResult<()> {
        self.inner.insert_position(position).await
    }

    async fn update_position(&self, id: PositionRowId, patch: &PositionPatch) -> StoreResult<bool> {
        self.inner.update_position(id, patch).await
    }

    async fn select_positions(&self, query: &PositionQuery) -> StoreResult<Vec<StoredPosition>> {
        let rows = self.inner.select_positions(query).await?;
        if self.armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        Ok(rows)
    }

    async fn delete_positions(&self, query: &PositionQuery) -> StoreResult<u64> {
        self.inner.delete_positions(query).await
    }
}
