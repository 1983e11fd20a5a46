//! Persistence layer for captures and positions.
//!
//! The reconciliation engine only talks to the store through the
//! [`PositionStore`] trait. Two implementations are provided:
//! - [`MemoryStore`] for tests and dry runs
//! - [`Database`] backed by PostgreSQL through sqlx

/// Store errors.
pub mod error;
/// In-memory store.
pub mod memory;
/// PostgreSQL repositories.
pub mod repositories;
/// Timeout and retry wrapper for store calls.
pub mod retry;
/// Store trait and query types.
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use repositories::{CaptureRepository, Database, PositionRepository};
pub use retry::RetryPolicy;
pub use store::{PositionPatch, PositionQuery, PositionStore, SortOrder};
