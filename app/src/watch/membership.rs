use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

use mirror_db::Database;

use super::{WatchError, WatchObserver};

/// In-process set of channel ids whose persisted `active` flag is true.
///
/// Single-process only: separate instances each keep their own copy and
/// do not see each other's watch mutations.
#[derive(Debug, Default)]
pub struct WatchMembership {
    state: RwLock<MembershipState>,
}

#[derive(Debug, Default)]
struct MembershipState {
    initialized: bool,
    channels: HashSet<String>,
}

impl WatchMembership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the set from the store. Must run once, before ingestion starts.
    ///
    /// The write lock is held across the load, so readers never see a
    /// half-filled set and lifecycle events queue up behind it.
    pub fn initialize(&self, db: &Database) -> Result<usize, WatchError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.initialized {
            return Err(WatchError::AlreadyInitialized);
        }
        let rows = db.get_active_watched_channels()?;
        state.channels = rows.into_iter().map(|row| row.channel_id).collect();
        state.initialized = true;
        tracing::info!(count = state.channels.len(), "Watch membership initialized");
        Ok(state.channels.len())
    }

    pub fn is_watched(&self, channel_id: &str) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .channels
            .contains(channel_id)
    }

    pub fn is_initialized(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .initialized
    }

    /// Sorted copy of the watched channel ids.
    pub fn snapshot(&self) -> Vec<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<String> = state.channels.iter().cloned().collect();
        ids.sort();
        ids
    }
}

impl WatchObserver for WatchMembership {
    fn on_watch_started(&self, channel_id: &str) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.channels.insert(channel_id.to_string()) {
            tracing::debug!(channel_id, "Channel added to watch membership");
        }
    }

    fn on_watch_stopped(&self, channel_id: &str) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.channels.remove(channel_id) {
            tracing::debug!(channel_id, "Channel removed from watch membership");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_loads_only_active_rows() {
        let db = Database::open_in_memory().unwrap();
        db.create_watched_channel("1", "one").unwrap();
        let two = db.create_watched_channel("2", "two").unwrap();
        db.set_watched_channel_active(two.id, false).unwrap();

        let membership = WatchMembership::new();
        assert!(!membership.is_initialized());
        assert_eq!(membership.initialize(&db).unwrap(), 1);
        assert!(membership.is_watched("1"));
        assert!(!membership.is_watched("2"));
        assert!(membership.is_initialized());
    }

    #[test]
    fn test_initialize_twice_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let membership = WatchMembership::new();
        membership.initialize(&db).unwrap();
        assert!(matches!(
            membership.initialize(&db),
            Err(WatchError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_notifications_are_idempotent() {
        let membership = WatchMembership::new();
        membership.on_watch_started("42");
        membership.on_watch_started("42");
        assert_eq!(membership.snapshot(), vec!["42".to_string()]);

        membership.on_watch_stopped("42");
        membership.on_watch_stopped("42");
        assert!(!membership.is_watched("42"));
        assert!(membership.snapshot().is_empty());
    }
}
