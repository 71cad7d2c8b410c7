use std::sync::Arc;

use mirror_db::{Database, DbError, Playlist, PlaylistKind, WatchedChannel};
use serde::Serialize;

use super::links::extract_urls;
use crate::reconcile::{ReconcileError, Reconciler, RemoteVideoService, RowKey, RowLocks};
use crate::watch::WatchMembership;

/// A chat message as seen by the ingestion pipeline.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub channel_id: String,
    pub author: String,
    pub body: String,
}

/// What happened to each video id found in one message.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub playlist: Option<String>,
    pub created: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

impl IngestReport {
    pub fn is_empty(&self) -> bool {
        self.playlist.is_none()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The membership cache says watched but the store has no row.
    #[error("watch membership out of sync: no watched channel row for {0}")]
    CacheDesync(String),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("could not resolve playlist for channel {channel}: {source}")]
    Playlist {
        channel: String,
        #[source]
        source: ReconcileError,
    },
}

pub struct MessageListener<R> {
    membership: Arc<WatchMembership>,
    reconciler: Arc<Reconciler<R>>,
    channel_locks: RowLocks,
}

impl<R: RemoteVideoService> MessageListener<R> {
    pub fn new(membership: Arc<WatchMembership>, reconciler: Arc<Reconciler<R>>) -> Self {
        Self {
            membership,
            reconciler,
            channel_locks: RowLocks::new(),
        }
    }

    fn db(&self) -> &Database {
        self.reconciler.db()
    }

    /// Mirror every YouTube link in `message` into its channel's playlist.
    ///
    /// Failures of single videos are logged and recorded in the report;
    /// they do not stop the remaining videos.
    pub async fn handle_message(&self, message: &IncomingMessage) -> Result<IngestReport, IngestError> {
        if !self.membership.is_watched(&message.channel_id) {
            return Ok(IngestReport::default());
        }

        let video_ids: Vec<String> = extract_urls(&message.body)
            .iter()
            .filter_map(|url| youtube_client::parse_video_id(url))
            .collect();
        if video_ids.is_empty() {
            tracing::trace!(channel_id = %message.channel_id, "No YouTube links in message");
            return Ok(IngestReport::default());
        }

        tracing::info!(
            channel_id = %message.channel_id,
            author = %message.author,
            count = video_ids.len(),
            "Matched YouTube URLs in watched channel"
        );

        let channel = self
            .db()
            .get_watched_channel(&message.channel_id)?
            .ok_or_else(|| IngestError::CacheDesync(message.channel_id.clone()))?;
        let playlist = self.channel_playlist(&channel).await?;

        let mut report = IngestReport {
            playlist: Some(playlist.name.clone()),
            ..IngestReport::default()
        };
        for video_id in video_ids {
            match self.ingest_video(&playlist, &video_id).await {
                Ok(true) => report.created.push(video_id),
                Ok(false) => {
                    tracing::info!(video_id = %video_id, playlist = %playlist.name, "Skipping video already in playlist");
                    report.skipped.push(video_id);
                }
                Err(e) => {
                    tracing::warn!(video_id = %video_id, playlist = %playlist.name, error = %e, "Failed to mirror video");
                    report.failed.push(video_id);
                }
            }
        }
        Ok(report)
    }

    /// `Ok(false)` when the playlist already has the video.
    async fn ingest_video(&self, playlist: &Playlist, video_id: &str) -> Result<bool, ReconcileError> {
        if self.db().get_song_by_video_id(playlist.id, video_id)?.is_some() {
            return Ok(false);
        }
        match self.reconciler.create_song(playlist, video_id).await {
            Ok(song) => {
                tracing::info!(song_id = song.id, video_id, "Created song");
                Ok(true)
            }
            Err(ReconcileError::DuplicateSong { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Latest playlist owned by the channel, created or synced as needed.
    async fn channel_playlist(&self, channel: &WatchedChannel) -> Result<Playlist, IngestError> {
        let _guard = self.channel_locks.lock(RowKey::WatchedChannel(channel.id)).await;
        let existing = match self.db().get_latest_playlist_for_channel(channel.id)? {
            Some(playlist) => Some(playlist),
            None => self.adopt_detached_playlist(channel)?,
        };
        let result = match existing {
            Some(playlist) if playlist.is_synced() => return Ok(playlist),
            Some(playlist) => self.reconciler.ensure_remote_playlist(&playlist).await,
            None => {
                self.reconciler
                    .create_playlist(&channel.name, PlaylistKind::Channel, Some(channel))
                    .await
            }
        };
        result.map_err(|source| IngestError::Playlist {
            channel: channel.channel_id.clone(),
            source,
        })
    }

    /// A channel playlist left without an owner (its channel row was deleted)
    /// is bound to the channel that now carries its name.
    fn adopt_detached_playlist(&self, channel: &WatchedChannel) -> Result<Option<Playlist>, IngestError> {
        let Some(playlist) = self.db().get_playlist_by_name(&channel.name)? else {
            return Ok(None);
        };
        if playlist.kind != PlaylistKind::Channel || playlist.watched_channel_id.is_some() {
            return Ok(None);
        }
        self.db().set_playlist_watched_channel(playlist.id, channel.id)?;
        tracing::info!(
            playlist_id = playlist.id,
            channel_id = %channel.channel_id,
            "Re-attached channel playlist"
        );
        Ok(Some(Playlist {
            watched_channel_id: Some(channel.id),
            ..playlist
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::testing::{FakeRemote, RemoteCall};
    use crate::watch::{WatchObserver, WatchService};

    struct Harness {
        db: Database,
        membership: Arc<WatchMembership>,
        watch: WatchService,
        listener: MessageListener<FakeRemote>,
        reconciler: Arc<Reconciler<FakeRemote>>,
    }

    fn harness() -> Harness {
        let db = Database::open_in_memory().unwrap();
        let membership = Arc::new(WatchMembership::new());
        membership.initialize(&db).unwrap();
        let watch = WatchService::new(db.clone()).with_observer(membership.clone());
        let reconciler = Arc::new(Reconciler::new(db.clone(), FakeRemote::new()));
        let listener = MessageListener::new(membership.clone(), reconciler.clone());
        Harness {
            db,
            membership,
            watch,
            listener,
            reconciler,
        }
    }

    fn message(channel_id: &str, body: &str) -> IncomingMessage {
        IncomingMessage {
            channel_id: channel_id.into(),
            author: "viewer".into(),
            body: body.into(),
        }
    }

    #[tokio::test]
    async fn first_link_creates_channel_playlist_and_song() {
        let h = harness();
        h.watch.watch("123", "general").unwrap();

        let report = h
            .listener
            .handle_message(&message(
                "123",
                "check this out https://www.youtube.com/watch?v=abc123",
            ))
            .await
            .unwrap();

        assert_eq!(report.playlist.as_deref(), Some("general"));
        assert_eq!(report.created, vec!["abc123".to_string()]);
        assert_eq!(
            h.reconciler.remote().calls(),
            vec![
                RemoteCall::CreatePlaylist("general".into()),
                RemoteCall::CreateItem {
                    playlist_id: "PL1".into(),
                    video_id: "abc123".into()
                },
            ]
        );

        let playlist = h.db.get_playlist_by_name("general").unwrap().unwrap();
        assert_eq!(playlist.kind, PlaylistKind::Channel);
        assert_eq!(playlist.youtube_playlist_id.as_deref(), Some("PL1"));
        let songs = h.db.get_playlist_songs(playlist.id).unwrap();
        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].youtube_playlist_item_id.as_deref(), Some("IT1"));
    }

    #[tokio::test]
    async fn reposting_same_link_is_a_no_op() {
        let h = harness();
        h.watch.watch("123", "general").unwrap();
        let msg = message("123", "https://youtu.be/abc123 and again youtu.be/abc123");

        let first = h.listener.handle_message(&msg).await.unwrap();
        assert_eq!(first.created, vec!["abc123".to_string()]);
        assert_eq!(first.skipped, vec!["abc123".to_string()]);

        let second = h.listener.handle_message(&msg).await.unwrap();
        assert!(second.created.is_empty());

        let playlist = h.db.get_playlist_by_name("general").unwrap().unwrap();
        assert_eq!(h.db.get_playlist_songs(playlist.id).unwrap().len(), 1);
        assert_eq!(h.reconciler.remote().create_count(), 2);
    }

    #[tokio::test]
    async fn messages_without_video_links_change_nothing() {
        let h = harness();
        h.watch.watch("123", "general").unwrap();

        let report = h
            .listener
            .handle_message(&message("123", "see https://example.com and someone@example.com"))
            .await
            .unwrap();
        assert!(report.is_empty());
        assert!(h.db.get_all_playlists().unwrap().is_empty());
        assert!(h.reconciler.remote().calls().is_empty());
    }

    #[tokio::test]
    async fn unwatched_channel_is_ignored() {
        let h = harness();
        h.watch.watch("123", "general").unwrap();
        h.watch.unwatch("123", false).unwrap();

        let report = h
            .listener
            .handle_message(&message("123", "https://youtu.be/abc123"))
            .await
            .unwrap();
        assert!(report.is_empty());
        assert!(h.reconciler.remote().calls().is_empty());
    }

    #[tokio::test]
    async fn one_failing_video_does_not_block_others() {
        let h = harness();
        h.watch.watch("123", "general").unwrap();
        h.reconciler.remote().fail_video("bad1");

        let report = h
            .listener
            .handle_message(&message(
                "123",
                "https://youtu.be/ok1 https://youtu.be/bad1 https://youtu.be/ok2",
            ))
            .await
            .unwrap();
        assert_eq!(report.created, vec!["ok1".to_string(), "ok2".to_string()]);
        assert_eq!(report.failed, vec!["bad1".to_string()]);
    }

    #[tokio::test]
    async fn cache_desync_is_raised() {
        let h = harness();
        h.membership.on_watch_started("999");

        let err = h
            .listener
            .handle_message(&message("999", "https://youtu.be/abc123"))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::CacheDesync(id) if id == "999"));
        assert!(h.reconciler.remote().calls().is_empty());
    }

    #[tokio::test]
    async fn unsynced_channel_playlist_is_resynced_first() {
        let h = harness();
        h.watch.watch("123", "general").unwrap();
        h.reconciler.remote().fail_playlist("general");

        let err = h
            .listener
            .handle_message(&message("123", "https://youtu.be/abc123"))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Playlist { .. }));
        let playlist = h.db.get_playlist_by_name("general").unwrap().unwrap();
        assert!(!playlist.is_synced());

        h.reconciler.remote().heal_playlist("general");
        let report = h
            .listener
            .handle_message(&message("123", "https://youtu.be/abc123"))
            .await
            .unwrap();
        assert_eq!(report.created, vec!["abc123".to_string()]);
        assert_eq!(h.db.get_all_playlists().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rewatched_channel_reuses_its_detached_playlist() {
        let h = harness();
        h.watch.watch("123", "general").unwrap();
        h.listener
            .handle_message(&message("123", "https://youtu.be/aaa"))
            .await
            .unwrap();

        h.watch.unwatch("123", true).unwrap();
        let detached = h.db.get_playlist_by_name("general").unwrap().unwrap();
        assert_eq!(detached.watched_channel_id, None);

        let channel = h.watch.watch("123", "general").unwrap();
        let report = h
            .listener
            .handle_message(&message("123", "https://youtu.be/bbb"))
            .await
            .unwrap();
        assert_eq!(report.playlist.as_deref(), Some("general"));
        assert_eq!(report.created, vec!["bbb".to_string()]);

        let playlist = h.db.get_playlist_by_name("general").unwrap().unwrap();
        assert_eq!(playlist.id, detached.id);
        assert_eq!(playlist.watched_channel_id, Some(channel.id));
        assert_eq!(h.db.get_playlist_songs(playlist.id).unwrap().len(), 2);
        let creates = h
            .reconciler
            .remote()
            .calls()
            .into_iter()
            .filter(|c| matches!(c, RemoteCall::CreatePlaylist(_)))
            .count();
        assert_eq!(creates, 1);
    }

    #[tokio::test]
    async fn manual_playlist_with_channel_name_is_not_adopted() {
        let h = harness();
        h.db.create_playlist("general", PlaylistKind::Manual, None).unwrap();
        h.watch.watch("123", "general").unwrap();

        let err = h
            .listener
            .handle_message(&message("123", "https://youtu.be/aaa"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IngestError::Playlist {
                source: ReconcileError::DuplicatePlaylist(_),
                ..
            }
        ));
        let manual = h.db.get_playlist_by_name("general").unwrap().unwrap();
        assert_eq!(manual.watched_channel_id, None);
    }

    #[tokio::test]
    async fn concurrent_first_messages_share_one_playlist() {
        let h = harness();
        h.watch.watch("123", "general").unwrap();
        let listener = Arc::new(h.listener);

        let a = {
            let listener = listener.clone();
            tokio::spawn(async move {
                listener.handle_message(&message("123", "https://youtu.be/aaa")).await
            })
        };
        let b = {
            let listener = listener.clone();
            tokio::spawn(async move {
                listener.handle_message(&message("123", "https://youtu.be/bbb")).await
            })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        assert_eq!(h.db.get_all_playlists().unwrap().len(), 1);
        let creates = h
            .reconciler
            .remote()
            .calls()
            .into_iter()
            .filter(|c| matches!(c, RemoteCall::CreatePlaylist(_)))
            .count();
        assert_eq!(creates, 1);
    }
}
