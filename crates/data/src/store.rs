//! The store seam used by the reconciliation engine.

use crate::error::StoreResult;
use async_trait::async_trait;
use lpscope_domain::{CanonicalKey, Capture, CaptureId, PositionRowId, StoredPosition};
use rust_decimal::Decimal;

/// Ordering of selected positions by capture time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Oldest capture first.
    #[default]
    Ascending,
    /// Newest capture first.
    Descending,
}

/// Filter, order and limit for a `positions` select or delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionQuery {
    /// Restrict to one capture.
    pub capture_id: Option<CaptureId>,
    /// Restrict to one canonical key.
    pub key: Option<CanonicalKey>,
    /// Restrict to one protocol (folded like a key protocol).
    pub protocol: Option<String>,
    /// Ordering by `captured_at`.
    pub order: SortOrder,
    /// Maximum number of rows.
    pub limit: Option<usize>,
}

impl PositionQuery {
    /// Every position.
    pub fn all() -> Self {
        Self::default()
    }

    /// Positions written by one capture.
    pub fn for_capture(capture_id: CaptureId) -> Self {
        Self {
            capture_id: Some(capture_id),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: CanonicalKey) -> Self {
        self.key = Some(key);
        self
    }

    #[must_use]
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    #[must_use]
    pub fn newest_first(mut self) -> Self {
        self.order = SortOrder::Descending;
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Evaluates the filter part of the query against a row.
    pub fn matches(&self, position: &StoredPosition) -> bool {
        if self.capture_id.is_some_and(|id| id != position.capture_id) {
            return false;
        }
        if self.key.as_ref().is_some_and(|key| *key != position.key) {
            return false;
        }
        if let Some(protocol) = &self.protocol {
            if CanonicalKey::fold_protocol(protocol) != position.key.protocol() {
                return false;
            }
        }
        true
    }
}

/// Column updates applied to a single `positions` row.
///
/// `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionPatch {
    pub token0: Option<String>,
    pub token1: Option<String>,
    pub token0_percentage: Option<Decimal>,
    pub token1_percentage: Option<Decimal>,
}

impl PositionPatch {
    pub fn is_empty(&self) -> bool {
        self.token0.is_none()
            && self.token1.is_none()
            && self.token0_percentage.is_none()
            && self.token1_percentage.is_none()
    }

    /// Returns the row as it reads after the patch is persisted.
    pub fn apply_to(&self, position: &StoredPosition) -> StoredPosition {
        let mut patched = position.clone();
        let observation = &mut patched.observation;
        if let Some(token0) = &self.token0 {
            observation.token0 = Some(token0.clone());
        }
        if let Some(token1) = &self.token1 {
            observation.token1 = Some(token1.clone());
        }
        if let Some(pct) = self.token0_percentage {
            observation.fields.token0_percentage = Some(pct);
        }
        if let Some(pct) = self.token1_percentage {
            observation.fields.token1_percentage = Some(pct);
        }
        patched
    }
}

/// Table store over `captures` and `positions`.
///
/// Every method is a single suspension point; callers wrap calls in a
/// [`RetryPolicy`](crate::RetryPolicy) to bound them with a timeout.
#[async_trait]
pub trait PositionStore: Send + Sync {
    /// Inserts a capture envelope.
    async fn insert_capture(&self, capture: &Capture) -> StoreResult<()>;

    /// Finds a capture by id.
    async fn find_capture(&self, id: CaptureId) -> StoreResult<Option<Capture>>;

    /// Returns the most recent captures, newest first.
    async fn recent_captures(&self, limit: usize) -> StoreResult<Vec<Capture>>;

    /// Deletes a capture and its positions.
    async fn delete_capture(&self, id: CaptureId) -> StoreResult<bool>;

    /// Inserts a position row. The referenced capture must exist.
    async fn insert_position(&self, position: &StoredPosition) -> StoreResult<()>;

    /// Applies a patch to one row. Returns `false` if the row does not exist.
    async fn update_position(&self, id: PositionRowId, patch: &PositionPatch)
    -> StoreResult<bool>;

    /// Selects positions matching the query.
    async fn select_positions(&self, query: &PositionQuery) -> StoreResult<Vec<StoredPosition>>;

    /// Deletes positions matching the query's filters. Order and limit are
    /// ignored.
    async fn delete_positions(&self, query: &PositionQuery) -> StoreResult<u64>;
}
