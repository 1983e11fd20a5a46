//! In-memory implementation of [`PositionStore`].

use crate::error::{StoreError, StoreResult};
use crate::store::{PositionPatch, PositionQuery, PositionStore, SortOrder};
use async_trait::async_trait;
use lpscope_domain::{Capture, CaptureId, PositionRowId, StoredPosition};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
struct Tables {
    captures: HashMap<CaptureId, Capture>,
    /// Insertion order, used for `recent_captures`.
    capture_order: Vec<CaptureId>,
    positions: Vec<StoredPosition>,
}

/// Store that keeps both tables in process memory.
///
/// Enforces the same constraints as the PostgreSQL schema: unique ids and
/// the `positions.capture_id` foreign key.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored positions.
    pub async fn position_count(&self) -> usize {
        self.tables.read().await.positions.len()
    }
}

#[async_trait]
impl PositionStore for MemoryStore {
    async fn insert_capture(&self, capture: &Capture) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.captures.contains_key(&capture.id) {
            return Err(StoreError::Fatal(format!(
                "duplicate key captures.id = {}",
                capture.id
            )));
        }
        tables.captures.insert(capture.id, capture.clone());
        tables.capture_order.push(capture.id);
        debug!(capture_id = %capture.id, "Inserted capture");
        Ok(())
    }

    async fn find_capture(&self, id: CaptureId) -> StoreResult<Option<Capture>> {
        Ok(self.tables.read().await.captures.get(&id).cloned())
    }

    async fn recent_captures(&self, limit: usize) -> StoreResult<Vec<Capture>> {
        let tables = self.tables.read().await;
        Ok(tables
            .capture_order
            .iter()
            .rev()
            .filter_map(|id| tables.captures.get(id).cloned())
            .take(limit)
            .collect())
    }

    async fn delete_capture(&self, id: CaptureId) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let removed = tables.captures.remove(&id).is_some();
        if removed {
            tables.capture_order.retain(|c| *c != id);
            tables.positions.retain(|p| p.capture_id != id);
        }
        Ok(removed)
    }

    async fn insert_position(&self, position: &StoredPosition) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.captures.contains_key(&position.capture_id) {
            return Err(StoreError::Fatal(format!(
                "foreign key violation: capture {} does not exist",
                position.capture_id
            )));
        }
        if tables.positions.iter().any(|p| p.id == position.id) {
            return Err(StoreError::Fatal(format!(
                "duplicate key positions.id = {}",
                position.id
            )));
        }
        tables.positions.push(position.clone());
        Ok(())
    }

    async fn update_position(
        &self,
        id: PositionRowId,
        patch: &PositionPatch,
    ) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.positions.iter_mut().find(|p| p.id == id) {
            Some(row) => {
                *row = patch.apply_to(row);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn select_positions(&self, query: &PositionQuery) -> StoreResult<Vec<StoredPosition>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<StoredPosition> = tables
            .positions
            .iter()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();

        rows.sort_by(|a, b| {
            let by_time = a.observation.captured_at.cmp(&b.observation.captured_at);
            let by_time = match query.order {
                SortOrder::Ascending => by_time,
                SortOrder::Descending => by_time.reverse(),
            };
            by_time.then_with(|| a.id.cmp(&b.id))
        });

        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn delete_positions(&self, query: &PositionQuery) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.positions.len();
        tables.positions.retain(|p| !query.matches(p));
        Ok((before - tables.positions.len()) as u64)
    }
}
