use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per room. Holding the guard makes the holder the only
/// writer of that room's document.
#[derive(Default)]
pub struct RoomLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl RoomLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, room_id: &str) -> OwnedMutexGuard<()> {
        let mutex = self
            .locks
            .entry(room_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }

    /// Drop locks that nobody holds or waits on
    pub fn prune_idle(&self) -> usize {
        let before = self.locks.len();
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
        before - self.locks.len()
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
