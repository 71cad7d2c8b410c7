use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OwnedMutexGuard;

/// Identifies one row guarded during a check-then-act sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKey {
    WatchedChannel(i64),
    Playlist(i64),
    Song(i64),
}

/// Short-lived async locks keyed by row. Entries are dropped once the
/// last holder or waiter releases them.
#[derive(Debug, Default)]
pub struct RowLocks {
    slots: Mutex<HashMap<RowKey, Arc<tokio::sync::Mutex<()>>>>,
}

pub struct RowGuard<'a> {
    locks: &'a RowLocks,
    key: RowKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl RowLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: RowKey) -> RowGuard<'_> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.entry(key).or_default().clone()
        };
        let guard = slot.lock_owned().await;
        RowGuard {
            locks: self,
            key,
            guard: Some(guard),
        }
    }

    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for RowGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut slots = self.locks.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let idle = slots
            .get(&self.key)
            .is_some_and(|slot| Arc::strong_count(slot) == 1);
        if idle {
            slots.remove(&self.key);
        }
    }
}
