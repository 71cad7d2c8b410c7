use mirror_db::{Database, DbError, Playlist, PlaylistKind, Song, WatchedChannel};

use super::{ReconcileError, RemoteVideoService, RowKey, RowLocks, SyncReport};

/// Keeps local rows and remote resources linked.
pub struct Reconciler<R> {
    db: Database,
    remote: R,
    locks: RowLocks,
}

impl<R: RemoteVideoService> Reconciler<R> {
    pub fn new(db: Database, remote: R) -> Self {
        Self {
            db,
            remote,
            locks: RowLocks::new(),
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Give the playlist a remote id if it has none. Already synced rows
    /// cause no remote call.
    pub async fn ensure_remote_playlist(&self, playlist: &Playlist) -> Result<Playlist, ReconcileError> {
        if playlist.is_synced() {
            return Ok(playlist.clone());
        }

        let _guard = self.locks.lock(RowKey::Playlist(playlist.id)).await;
        let current = self
            .db
            .get_playlist(playlist.id)?
            .ok_or_else(|| ReconcileError::Gone(format!("playlist \"{}\"", playlist.name)))?;
        if current.is_synced() {
            return Ok(current);
        }

        tracing::info!(playlist_id = current.id, name = %current.name, "Creating YouTube playlist");
        let remote_id = self
            .remote
            .create_playlist(&current.name)
            .await?
            .ok_or_else(|| ReconcileError::MissingRemoteId(format!("playlist \"{}\"", current.name)))?;
        self.db.set_playlist_youtube_id(current.id, &remote_id)?;
        tracing::info!(playlist_id = current.id, youtube_playlist_id = %remote_id, "Playlist synced");

        Ok(Playlist {
            youtube_playlist_id: Some(remote_id),
            ..current
        })
    }

    /// Insert a playlist row and sync it. If the sync fails the row stays,
    /// unsynced, for a later bulk sync.
    pub async fn create_playlist(
        &self,
        name: &str,
        kind: PlaylistKind,
        owner: Option<&WatchedChannel>,
    ) -> Result<Playlist, ReconcileError> {
        let playlist = self
            .db
            .create_playlist(name, kind, owner.map(|c| c.id))
            .map_err(|e| match e {
                DbError::Conflict(_) => ReconcileError::DuplicatePlaylist(name.to_string()),
                other => other.into(),
            })?;
        tracing::info!(playlist_id = playlist.id, name, %kind, "Playlist created");
        self.ensure_remote_playlist(&playlist).await
    }

    /// Delete remotely first, then locally. A failed remote delete keeps
    /// the local row.
    pub async fn delete_playlist(&self, playlist: &Playlist) -> Result<(), ReconcileError> {
        let _guard = self.locks.lock(RowKey::Playlist(playlist.id)).await;
        let Some(current) = self.db.get_playlist(playlist.id)? else {
            return Ok(());
        };

        if let Some(remote_id) = &current.youtube_playlist_id {
            self.remote.delete_playlist(remote_id).await?;
            tracing::info!(youtube_playlist_id = %remote_id, "YouTube playlist deleted");
        }
        self.db.delete_playlist(current.id)?;
        tracing::info!(playlist_id = current.id, name = %current.name, "Playlist deleted");
        Ok(())
    }

    /// Give the song a remote item id. Deferred while the playlist is unsynced.
    pub async fn ensure_remote_item(&self, song: &Song, playlist: &Playlist) -> Result<Song, ReconcileError> {
        if song.is_linked() {
            return Ok(song.clone());
        }
        let Some(remote_playlist_id) = &playlist.youtube_playlist_id else {
            tracing::info!(
                song_id = song.id,
                playlist = %playlist.name,
                "Playlist not synced yet; deferring playlist item"
            );
            return Ok(song.clone());
        };

        let _guard = self.locks.lock(RowKey::Song(song.id)).await;
        let current = self
            .db
            .get_song(song.id)?
            .ok_or_else(|| ReconcileError::Gone(format!("song {}", song.youtube_video_id)))?;
        if current.is_linked() {
            return Ok(current);
        }

        tracing::info!(video_id = %current.youtube_video_id, playlist = %playlist.name, "Creating YouTube playlist item");
        let item_id = self
            .remote
            .create_playlist_item(remote_playlist_id, &current.youtube_video_id)
            .await?
            .ok_or_else(|| {
                ReconcileError::MissingRemoteId(format!("video {}", current.youtube_video_id))
            })?;
        self.db.set_song_playlist_item_id(current.id, &item_id)?;

        Ok(Song {
            youtube_playlist_item_id: Some(item_id),
            ..current
        })
    }

    /// Insert a song into a synced playlist and link it.
    pub async fn create_song(&self, playlist: &Playlist, video_id: &str) -> Result<Song, ReconcileError> {
        if !playlist.is_synced() {
            return Err(ReconcileError::UnsyncedPlaylist(playlist.name.clone()));
        }
        let song = self
            .db
            .create_song(playlist.id, video_id)
            .map_err(|e| match e {
                DbError::Conflict(_) => ReconcileError::DuplicateSong {
                    playlist: playlist.name.clone(),
                    video_id: video_id.to_string(),
                },
                other => other.into(),
            })?;
        tracing::info!(song_id = song.id, video_id, playlist = %playlist.name, "Song created");
        self.ensure_remote_item(&song, playlist).await
    }

    pub async fn delete_song(&self, song: &Song) -> Result<(), ReconcileError> {
        let _guard = self.locks.lock(RowKey::Song(song.id)).await;
        let Some(current) = self.db.get_song(song.id)? else {
            return Ok(());
        };

        if let Some(item_id) = &current.youtube_playlist_item_id {
            self.remote.delete_playlist_item(item_id).await?;
        }
        self.db.delete_song(current.id)?;
        tracing::info!(song_id = current.id, video_id = %current.youtube_video_id, "Song removed");
        Ok(())
    }

    /// Sync every playlist, then every song under it. Individual failures
    /// are logged and counted; only store errors abort the pass.
    pub async fn sync_all(&self) -> Result<SyncReport, ReconcileError> {
        let mut report = SyncReport::default();

        for playlist in self.db.get_all_playlists()? {
            report.playlists_checked += 1;
            let was_synced = playlist.is_synced();
            let playlist = match self.ensure_remote_playlist(&playlist).await {
                Ok(synced) => {
                    if !was_synced {
                        report.playlists_created += 1;
                    }
                    synced
                }
                Err(ReconcileError::Db(e)) => return Err(e.into()),
                Err(e) => {
                    tracing::warn!(playlist = %playlist.name, error = %e, "Playlist sync failed");
                    report.playlists_failed += 1;
                    playlist
                }
            };

            for song in self.db.get_playlist_songs(playlist.id)? {
                if song.is_linked() {
                    continue;
                }
                if !playlist.is_synced() {
                    report.items_deferred += 1;
                    continue;
                }
                match self.ensure_remote_item(&song, &playlist).await {
                    Ok(linked) if linked.is_linked() => report.items_created += 1,
                    Ok(_) => report.items_deferred += 1,
                    Err(ReconcileError::Db(e)) => return Err(e.into()),
                    Err(e) => {
                        tracing::warn!(
                            playlist = %playlist.name,
                            video_id = %song.youtube_video_id,
                            error = %e,
                            "Playlist item sync failed"
                        );
                        report.items_failed += 1;
                    }
                }
            }
        }

        tracing::info!(?report, "Bulk sync finished");
        Ok(report)
    }
}
