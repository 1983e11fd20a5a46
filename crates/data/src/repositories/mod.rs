//! Repository implementations for database persistence.
//!
//! This module provides the PostgreSQL side of the store: one repository per
//! table and a [`Database`] wrapper that implements [`PositionStore`].

mod capture_repository;
mod position_repository;

pub use capture_repository::CaptureRepository;
pub use position_repository::PositionRepository;

use crate::error::StoreResult;
use crate::store::{PositionPatch, PositionQuery, PositionStore};
use async_trait::async_trait;
use lpscope_domain::{Capture, CaptureId, PositionRowId, StoredPosition};
use sqlx::PgPool;
use std::sync::Arc;

/// Database connection wrapper for repositories.
#[derive(Clone)]
pub struct Database {
    pool: Arc<PgPool>,
}

impl Database {
    /// Creates a new Database wrapper from a connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Creates a new database connection from a connection string.
    ///
    /// # Arguments
    /// * `database_url` - PostgreSQL connection string
    ///
    /// # Errors
    /// Returns an error if the connection fails.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates a CaptureRepository instance.
    #[must_use]
    pub fn captures(&self) -> CaptureRepository {
        CaptureRepository::new(self.pool.clone())
    }

    /// Creates a PositionRepository instance.
    #[must_use]
    pub fn positions(&self) -> PositionRepository {
        PositionRepository::new(self.pool.clone())
    }

    /// Runs database migrations.
    ///
    /// # Errors
    /// Returns an error if migrations fail.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::raw_sql(include_str!("../../migrations/001_initial_schema.sql"))
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }
}

#[async_trait]
impl PositionStore for Database {
    async fn insert_capture(&self, capture: &Capture) -> StoreResult<()> {
        Ok(self.captures().insert(capture).await?)
    }

    async fn find_capture(&self, id: CaptureId) -> StoreResult<Option<Capture>> {
        Ok(self.captures().find_by_id(id).await?)
    }

    async fn recent_captures(&self, limit: usize) -> StoreResult<Vec<Capture>> {
        Ok(self.captures().find_recent(limit).await?)
    }

    async fn delete_capture(&self, id: CaptureId) -> StoreResult<bool> {
        Ok(self.captures().delete(id).await?)
    }

    async fn insert_position(&self, position: &StoredPosition) -> StoreResult<()> {
        Ok(self.positions().insert(position).await?)
    }

    async fn update_position(
        &self,
        id: PositionRowId,
        patch: &PositionPatch,
    ) -> StoreResult<bool> {
        Ok(self.positions().update(id, patch).await?)
    }

    async fn select_positions(&self, query: &PositionQuery) -> StoreResult<Vec<StoredPosition>> {
        Ok(self.positions().select(query).await?)
    }

    async fn delete_positions(&self, query: &PositionQuery) -> StoreResult<u64> {
        Ok(self.positions().delete(query).await?)
    }
}
