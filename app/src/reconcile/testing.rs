//! Recording stand-in for the remote video service.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use super::{RemoteError, RemoteVideoService};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    CreatePlaylist(String),
    DeletePlaylist(String),
    CreateItem { playlist_id: String, video_id: String },
    DeleteItem(String),
}

/// Hands out ids `PL1, PL2, ...` and `IT1, IT2, ...` and records every
/// mutating call in order.
#[derive(Debug, Default)]
pub struct FakeRemote {
    state: Mutex<FakeState>,
}

#[derive(Debug, Default)]
struct FakeState {
    calls: Vec<RemoteCall>,
    next_playlist: u32,
    next_item: u32,
    fail_playlist_names: HashSet<String>,
    fail_video_ids: HashSet<String>,
    fail_deletes: bool,
    omit_ids: bool,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut FakeState) -> T) -> T {
        f(&mut self.state.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.with_state(|s| s.calls.clone())
    }

    pub fn create_count(&self) -> usize {
        self.with_state(|s| {
            s.calls
                .iter()
                .filter(|c| matches!(c, RemoteCall::CreatePlaylist(_) | RemoteCall::CreateItem { .. }))
                .count()
        })
    }

    pub fn fail_playlist(&self, name: &str) {
        self.with_state(|s| s.fail_playlist_names.insert(name.to_string()));
    }

    pub fn heal_playlist(&self, name: &str) {
        self.with_state(|s| s.fail_playlist_names.remove(name));
    }

    pub fn fail_video(&self, video_id: &str) {
        self.with_state(|s| s.fail_video_ids.insert(video_id.to_string()));
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.with_state(|s| s.fail_deletes = fail);
    }

    pub fn omit_ids(&self, omit: bool) {
        self.with_state(|s| s.omit_ids = omit);
    }
}

impl RemoteVideoService for FakeRemote {
    async fn create_playlist(&self, name: &str) -> Result<Option<String>, RemoteError> {
        tokio::task::yield_now().await;
        self.with_state(|s| {
            s.calls.push(RemoteCall::CreatePlaylist(name.to_string()));
            if s.fail_playlist_names.contains(name) {
                return Err(RemoteError::Other(format!("create playlist {name} refused")));
            }
            if s.omit_ids {
                return Ok(None);
            }
            s.next_playlist += 1;
            Ok(Some(format!("PL{}", s.next_playlist)))
        })
    }

    async fn delete_playlist(&self, playlist_id: &str) -> Result<(), RemoteError> {
        self.with_state(|s| {
            s.calls.push(RemoteCall::DeletePlaylist(playlist_id.to_string()));
            if s.fail_deletes {
                return Err(RemoteError::Other("delete refused".into()));
            }
            Ok(())
        })
    }

    async fn create_playlist_item(
        &self,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<Option<String>, RemoteError> {
        tokio::task::yield_now().await;
        self.with_state(|s| {
            s.calls.push(RemoteCall::CreateItem {
                playlist_id: playlist_id.to_string(),
                video_id: video_id.to_string(),
            });
            if s.fail_video_ids.contains(video_id) {
                return Err(RemoteError::Other(format!("video {video_id} refused")));
            }
            if s.omit_ids {
                return Ok(None);
            }
            s.next_item += 1;
            Ok(Some(format!("IT{}", s.next_item)))
        })
    }

    async fn delete_playlist_item(&self, item_id: &str) -> Result<(), RemoteError> {
        self.with_state(|s| {
            s.calls.push(RemoteCall::DeleteItem(item_id.to_string()));
            if s.fail_deletes {
                return Err(RemoteError::Other("delete refused".into()));
            }
            Ok(())
        })
    }

    async fn resolve_video_id(&self, url: &str) -> Result<Option<String>, RemoteError> {
        Ok(youtube_client::parse_video_id(url))
    }
}
