use lpscope_domain::CaptureId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-capture async mutexes.
///
/// Sweeps for the same capture queue behind one another; sweeps for
/// different captures never contend.
#[derive(Debug, Default)]
pub struct CaptureLocks {
    locks: Mutex<HashMap<CaptureId, Arc<Mutex<()>>>>,
}

impl CaptureLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for the capture's lock and returns its guard.
    pub async fn acquire(&self, capture_id: CaptureId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Entries only the registry still references are idle.
            locks.retain(|id, lock| *id == capture_id || Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(capture_id).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of captures with a lock entry.
    #[cfg(test)]
    async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}
