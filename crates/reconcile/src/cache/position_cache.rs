use crate::config::CacheConfig;
use crate::error::EngineResult;
use crate::merge::RecordMerger;
use chrono::{DateTime, Utc};
use lpscope_data::{PositionQuery, PositionStore, RetryPolicy};
use lpscope_domain::{CanonicalKey, Clock, PositionRecord};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Cache counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups served from memory.
    pub hits: u64,
    /// Lookups that triggered a rebuild.
    pub misses: u64,
    /// Rebuilds whose result was installed.
    pub rebuilds: u64,
    /// Keys currently held.
    pub entries: usize,
    /// Keys invalidated since the last rebuild.
    pub stale_keys: usize,
    /// When the last installed rebuild finished.
    pub last_rebuild_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct CacheState {
    records: BTreeMap<CanonicalKey, PositionRecord>,
    /// A rebuild has been installed since the last `invalidate_all`.
    populated: bool,
    stale: HashSet<CanonicalKey>,
    /// Bumped by every invalidation; rebuilds compare it to detect races.
    invalidations: u64,
    /// Bumped by every mutation of `records`.
    version: u64,
    snapshot: Option<(u64, Arc<Vec<PositionRecord>>)>,
    last_rebuild_at: Option<DateTime<Utc>>,
}

impl CacheState {
    fn is_fresh(&self, key: &CanonicalKey) -> bool {
        self.populated && !self.stale.contains(key)
    }

    fn is_fully_fresh(&self) -> bool {
        self.populated && self.stale.is_empty()
    }

    /// The memoized list, if it matches the current records.
    fn memoized(&self) -> Option<Arc<Vec<PositionRecord>>> {
        match &self.snapshot {
            Some((version, snapshot)) if *version == self.version => Some(Arc::clone(snapshot)),
            _ => None,
        }
    }

    fn snapshot(&mut self) -> Arc<Vec<PositionRecord>> {
        if let Some(snapshot) = self.memoized() {
            return snapshot;
        }
        let snapshot = Arc::new(self.records.values().cloned().collect::<Vec<_>>());
        self.snapshot = Some((self.version, Arc::clone(&snapshot)));
        snapshot
    }

    fn install(&mut self, records: BTreeMap<CanonicalKey, PositionRecord>, at: DateTime<Utc>) {
        self.records = records;
        self.populated = true;
        self.stale.clear();
        self.version += 1;
        self.snapshot = None;
        self.last_rebuild_at = Some(at);
    }

    fn bump(&mut self) {
        self.invalidations += 1;
        self.version += 1;
        self.snapshot = None;
    }
}

/// Cache of the selected [`PositionRecord`] per [`CanonicalKey`].
///
/// The per-key map is the only state; the list returned by [`all`](Self::all)
/// is derived from it and memoized until the next mutation. The lock is
/// only held for in-memory work, never across a store call.
///
/// A rebuild fetches every stored row, groups them by key and keeps the
/// winner of each group. A rebuild that was overtaken by an invalidation is
/// not installed, so data invalidated while it was in flight is never served
/// from the cache afterwards.
pub struct PositionCache {
    store: Arc<dyn PositionStore>,
    clock: Arc<dyn Clock>,
    config: CacheConfig,
    retry: RetryPolicy,
    state: RwLock<CacheState>,
    hits: AtomicU64,
    misses: AtomicU64,
    rebuilds: AtomicU64,
}

impl PositionCache {
    /// Creates an empty cache; the first lookup rebuilds it.
    pub fn new(
        store: Arc<dyn PositionStore>,
        clock: Arc<dyn Clock>,
        config: CacheConfig,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            clock,
            config,
            retry,
            state: RwLock::new(CacheState::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            rebuilds: AtomicU64::new(0),
        }
    }

    /// Returns the selected record for `key`, rebuilding when the cache is
    /// empty or the key was invalidated.
    ///
    /// `Ok(None)` means no row exists for the key.
    ///
    /// # Errors
    /// Returns the store error when a needed rebuild fails. The cached
    /// contents are left as they were.
    pub async fn get(&self, key: &CanonicalKey) -> EngineResult<Option<PositionRecord>> {
        {
            let state = self.state.read().await;
            if state.is_fresh(key) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Position cache hit");
                return Ok(state.records.get(key).cloned());
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(key = %key, "Position cache miss");
        let records = self.rebuild().await?;
        Ok(records.get(key).cloned())
    }

    /// Returns every selected record, ordered by key.
    ///
    /// # Errors
    /// Returns the store error when a needed rebuild fails.
    pub async fn all(&self) -> EngineResult<Arc<Vec<PositionRecord>>> {
        {
            let state = self.state.read().await;
            if let Some(snapshot) = state.memoized().filter(|_| state.is_fully_fresh()) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(snapshot);
            }
        }
        {
            // Only building the memo needs exclusive access.
            let mut state = self.state.write().await;
            if state.is_fully_fresh() {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(state.snapshot());
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let records = self.rebuild().await?;

        let mut state = self.state.write().await;
        if state.is_fully_fresh() {
            return Ok(state.snapshot());
        }
        Ok(Arc::new(records.into_values().collect()))
    }

    /// Drops `key`; the next lookup for it rebuilds.
    pub async fn invalidate(&self, key: &CanonicalKey) {
        let mut state = self.state.write().await;
        state.records.remove(key);
        state.stale.insert(key.clone());
        state.bump();
        debug!(key = %key, "Invalidated cached position");
    }

    /// Drops everything.
    pub async fn invalidate_all(&self) {
        let mut state = self.state.write().await;
        state.records.clear();
        state.stale.clear();
        state.populated = false;
        state.bump();
        debug!("Invalidated position cache");
    }

    /// Whether a rebuild has been installed since the last
    /// [`invalidate_all`](Self::invalidate_all).
    pub async fn has_data(&self) -> bool {
        self.state.read().await.populated
    }

    /// Current counters.
    pub async fn stats(&self) -> CacheStats {
        let state = self.state.read().await;
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            rebuilds: self.rebuilds.load(Ordering::Relaxed),
            entries: state.records.len(),
            stale_keys: state.stale.len(),
            last_rebuild_at: state.last_rebuild_at,
        }
    }

    async fn rebuild(&self) -> EngineResult<BTreeMap<CanonicalKey, PositionRecord>> {
        let passes = self.config.max_rebuild_passes.max(1);
        let query = PositionQuery::all();
        let mut latest = BTreeMap::new();

        for pass in 1..=passes {
            let epoch = self.state.read().await.invalidations;

            let rows = self
                .retry
                .run("select_positions", || self.store.select_positions(&query))
                .await?;
            let records = RecordMerger::select_per_key(&rows);

            let mut state = self.state.write().await;
            if state.invalidations == epoch {
                state.install(records.clone(), self.clock.now());
                self.rebuilds.fetch_add(1, Ordering::Relaxed);
                info!(
                    rows = rows.len(),
                    keys = records.len(),
                    pass = pass,
                    "Rebuilt position cache"
                );
                return Ok(records);
            }
            drop(state);

            debug!(pass = pass, "Invalidation landed during rebuild, discarding");
            latest = records;
        }

        warn!(
            passes = passes,
            "Position cache rebuild kept racing invalidations, serving uncached result"
        );
        Ok(latest)
    }
}
