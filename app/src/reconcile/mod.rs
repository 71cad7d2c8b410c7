//! Lazily links local playlist and song rows to their YouTube counterparts.
//!
//! Every row starts unsynced and gains a remote id at most once. Each
//! check-then-act runs under a lock keyed by the row and re-reads the row
//! inside the lock, so concurrent callers in this process never create
//! the same remote resource twice.

mod engine;
mod locks;
mod remote;
#[cfg(test)]
pub(crate) mod testing;

use std::future::Future;

use mirror_db::DbError;
use serde::Serialize;
use youtube_client::YouTubeError;

pub use engine::Reconciler;
pub use locks::{RowKey, RowLocks};
pub use remote::YouTubeRemote;
pub(crate) use remote::to_db_token;

/// Remote playlist operations the engine depends on.
pub trait RemoteVideoService: Send + Sync {
    /// Create a playlist, returning its remote id when the service reports one.
    fn create_playlist(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<String>, RemoteError>> + Send;

    fn delete_playlist(&self, playlist_id: &str)
    -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Append a video to a remote playlist, returning the item id.
    fn create_playlist_item(
        &self,
        playlist_id: &str,
        video_id: &str,
    ) -> impl Future<Output = Result<Option<String>, RemoteError>> + Send;

    fn delete_playlist_item(&self, item_id: &str)
    -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Map a URL to the id of an existing video, or `None`.
    fn resolve_video_id(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<Option<String>, RemoteError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error(transparent)]
    YouTube(#[from] YouTubeError),

    #[error("YouTube is not connected; authorize at /auth/youtube")]
    NotConnected,

    #[error("token store error: {0}")]
    Store(#[from] DbError),

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("remote call failed: {0}")]
    Remote(#[from] RemoteError),

    #[error("a playlist named \"{0}\" already exists")]
    DuplicatePlaylist(String),

    #[error("video {video_id} is already in playlist \"{playlist}\"")]
    DuplicateSong { playlist: String, video_id: String },

    #[error("playlist \"{0}\" is not synced with YouTube")]
    UnsyncedPlaylist(String),

    #[error("YouTube returned no id for {0}")]
    MissingRemoteId(String),

    #[error("{0} no longer exists")]
    Gone(String),
}

/// Outcome counts of a bulk sync pass.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub playlists_checked: usize,
    pub playlists_created: usize,
    pub playlists_failed: usize,
    pub items_created: usize,
    pub items_failed: usize,
    /// Songs left unlinked because their playlist is still unsynced.
    pub items_deferred: usize,
}
