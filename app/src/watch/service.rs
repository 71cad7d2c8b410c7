use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use mirror_db::{Database, DbError, WatchedChannel};

use super::{WatchError, WatchObserver};

/// Persists watch mutations and notifies observers once each write lands.
///
/// Every mutation holds `mutations` from the store read through the last
/// notification, so observers see changes in the order they were persisted.
#[derive(Clone)]
pub struct WatchService {
    db: Database,
    observers: Vec<Arc<dyn WatchObserver>>,
    mutations: Arc<Mutex<()>>,
}

impl WatchService {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            observers: Vec::new(),
            mutations: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn WatchObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.mutations.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn list(&self) -> Result<Vec<WatchedChannel>, WatchError> {
        Ok(self.db.get_all_watched_channels()?)
    }

    /// Insert a new, active watched channel.
    pub fn create_watch(&self, channel_id: &str, name: &str) -> Result<WatchedChannel, WatchError> {
        let _guard = self.lock();
        self.insert_row(channel_id, name)
    }

    /// Re-activate an existing watched channel row.
    pub fn start_watching(&self, row: &WatchedChannel) -> Result<WatchedChannel, WatchError> {
        let _guard = self.lock();
        self.set_active(row, true)
    }

    pub fn stop_watching(&self, row: &WatchedChannel) -> Result<WatchedChannel, WatchError> {
        let _guard = self.lock();
        self.set_active(row, false)
    }

    /// Remove the row entirely. Owned playlists are kept but detached.
    pub fn delete_watch(&self, row: &WatchedChannel) -> Result<(), WatchError> {
        let _guard = self.lock();
        self.remove_row(row)
    }

    /// Watch a channel: create it on first use, re-activate it otherwise.
    pub fn watch(&self, channel_id: &str, name: &str) -> Result<WatchedChannel, WatchError> {
        let _guard = self.lock();
        match self.db.get_watched_channel(channel_id)? {
            Some(row) if row.active => Err(WatchError::AlreadyWatched(channel_id.to_string())),
            Some(row) => self.set_active(&row, true),
            None => self.insert_row(channel_id, name),
        }
    }

    /// Stop watching a channel by id; optionally delete its row as well.
    pub fn unwatch(&self, channel_id: &str, purge: bool) -> Result<(), WatchError> {
        let _guard = self.lock();
        let row = self
            .db
            .get_watched_channel(channel_id)?
            .ok_or_else(|| WatchError::NotWatched(channel_id.to_string()))?;
        if purge {
            return self.remove_row(&row);
        }
        if !row.active {
            return Err(WatchError::NotWatched(channel_id.to_string()));
        }
        self.set_active(&row, false).map(|_| ())
    }

    fn insert_row(&self, channel_id: &str, name: &str) -> Result<WatchedChannel, WatchError> {
        let row = self
            .db
            .create_watched_channel(channel_id, name)
            .map_err(|e| match e {
                DbError::Conflict(_) => WatchError::AlreadyWatched(channel_id.to_string()),
                other => other.into(),
            })?;
        tracing::info!(channel_id, name, "Watched channel created");
        self.notify_started(channel_id);
        Ok(row)
    }

    fn set_active(&self, row: &WatchedChannel, active: bool) -> Result<WatchedChannel, WatchError> {
        self.db.set_watched_channel_active(row.id, active)?;
        if active {
            tracing::info!(channel_id = %row.channel_id, "Watching channel");
            self.notify_started(&row.channel_id);
        } else {
            tracing::info!(channel_id = %row.channel_id, "Stopped watching channel");
            self.notify_stopped(&row.channel_id);
        }
        Ok(WatchedChannel {
            active,
            ..row.clone()
        })
    }

    fn remove_row(&self, row: &WatchedChannel) -> Result<(), WatchError> {
        self.db.delete_watched_channel(row.id)?;
        tracing::info!(channel_id = %row.channel_id, "Watched channel deleted");
        self.notify_stopped(&row.channel_id);
        Ok(())
    }

    fn notify_started(&self, channel_id: &str) {
        for observer in &self.observers {
            observer.on_watch_started(channel_id);
        }
    }

    fn notify_stopped(&self, channel_id: &str) {
        for observer in &self.observers {
            observer.on_watch_stopped(channel_id);
        }
    }
}
