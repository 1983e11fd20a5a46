//! Read-through cache of the selected record per key.

mod position_cache;

pub use position_cache::{CacheStats, PositionCache};
