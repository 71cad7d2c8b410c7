//! Watched channel lifecycle and the in-memory membership cache.

mod membership;
mod service;

pub use membership::WatchMembership;
pub use service::WatchService;

use mirror_db::DbError;

/// Receives lifecycle notifications after a watch mutation is persisted.
///
/// Implementations must be idempotent: the same notification can arrive
/// more than once for one channel.
pub trait WatchObserver: Send + Sync {
    fn on_watch_started(&self, channel_id: &str);
    fn on_watch_stopped(&self, channel_id: &str);
}

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("channel {0} is already being watched")]
    AlreadyWatched(String),

    #[error("channel {0} is not being watched")]
    NotWatched(String),

    #[error("membership cache is already initialized")]
    AlreadyInitialized,
}
