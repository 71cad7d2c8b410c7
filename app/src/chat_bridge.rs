//! Chat bridge: feeds Twitch chat from every watched channel into the
//! ingestion pipeline.
//!
//! Waits for Twitch credentials, a reader token and at least one watched
//! channel, then holds one EventSub connection subscribed to all of them.
//! The connection is rebuilt whenever watch membership changes or the
//! stream closes.

use std::sync::Arc;
use std::time::Duration;

use mirror_db::tokens::PROVIDER_TWITCH;
use tokio::sync::{Notify, mpsc};
use tokio_util::sync::CancellationToken;
use twitch_client::auth::TwitchAuth;
use twitch_client::eventsub::{EventSubClient, EventSubConfig};
use twitch_client::{ChatMessage, Token};

use crate::app::SharedState;
use crate::background::sleep_or_cancel;
use crate::ingest::{IncomingMessage, IngestError, MessageListener};
use crate::reconcile::RemoteVideoService;

const IDLE_POLL: Duration = Duration::from_secs(30);
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

enum StreamEnd {
    Shutdown,
    MembershipChanged,
    Closed,
}

pub(crate) fn to_twitch_token(t: &mirror_db::tokens::Token) -> Token {
    Token {
        access_token: t.access_token.clone(),
        refresh_token: t.refresh_token.clone(),
        scope: t.scope.clone(),
        expires_at: t.expires_at,
    }
}

pub(crate) fn twitch_to_db_token(t: &Token) -> mirror_db::tokens::Token {
    mirror_db::tokens::Token {
        access_token: t.access_token.clone(),
        refresh_token: t.refresh_token.clone(),
        scope: t.scope.clone(),
        expires_at: t.expires_at,
    }
}

/// Start the chat bridge loop. Returns on shutdown.
pub async fn run<R: RemoteVideoService + 'static>(state: SharedState<R>) {
    let shutdown = state.shutdown_token().clone();
    let changed = state.chat_changed();

    // Wait for startup to complete
    if sleep_or_cancel(&shutdown, Duration::from_secs(5)).await {
        return;
    }

    loop {
        let Some(config) = wait_for_config(&state, &shutdown, &changed).await else {
            tracing::info!("Chat bridge stopped (shutdown)");
            return;
        };

        tracing::info!(channels = config.channels.len(), "Starting EventSub chat connection");
        let (messages, stop) = EventSubClient::connect(config);
        let end = forward_messages(state.listener(), messages, &changed, &shutdown).await;
        let _ = stop.try_send(());

        match end {
            StreamEnd::Shutdown => {
                tracing::info!("Chat bridge stopped (shutdown)");
                return;
            }
            StreamEnd::MembershipChanged => {
                tracing::info!("Watched channels changed, resubscribing chat");
            }
            StreamEnd::Closed => {
                tracing::warn!("EventSub chat stream ended, will reconnect");
                if sleep_or_cancel(&shutdown, RECONNECT_DELAY).await {
                    return;
                }
            }
        }
    }
}

/// Block until an EventSub connection can be configured. `None` on shutdown.
async fn wait_for_config<R>(
    state: &SharedState<R>,
    shutdown: &CancellationToken,
    changed: &Notify,
) -> Option<EventSubConfig> {
    loop {
        match try_build_config(state).await {
            Ok(Some(config)) => return Some(config),
            Ok(None) => {}
            Err(e) => tracing::warn!("Chat bridge not ready: {e}"),
        }

        tokio::select! {
            _ = shutdown.cancelled() => return None,
            _ = changed.notified() => {}
            _ = tokio::time::sleep(IDLE_POLL) => {}
        }
    }
}

async fn try_build_config<R>(state: &SharedState<R>) -> Result<Option<EventSubConfig>, String> {
    let config = state.config().await.clone();
    if !config.twitch_configured() {
        return Ok(None);
    }

    let channels = state.membership().snapshot();
    if channels.is_empty() {
        tracing::debug!("No watched channels, chat bridge idle");
        return Ok(None);
    }

    let Some(stored) = state
        .db()
        .get_latest_token(PROVIDER_TWITCH)
        .map_err(|e| format!("failed to load Twitch token: {e}"))?
    else {
        return Ok(None);
    };

    let auth = TwitchAuth::new(
        config.twitch_client_id.clone(),
        config.twitch_client_secret.clone(),
        config.twitch_redirect_uri(),
    );
    let current = to_twitch_token(&stored);
    let token = match auth.get_or_refresh_token(&current).await {
        Ok(Some(refreshed)) => {
            let db_token = twitch_to_db_token(&refreshed);
            if let Err(e) = state.db().save_token(PROVIDER_TWITCH, &db_token) {
                tracing::warn!("Failed to persist refreshed Twitch token: {e}");
            }
            refreshed
        }
        Ok(None) => current,
        Err(e) => return Err(format!("Twitch token unusable: {e}")),
    };

    Ok(Some(EventSubConfig {
        client_id: config.twitch_client_id,
        access_token: token.access_token,
        reader_user_id: config.twitch_user_id,
        channels,
    }))
}

/// Hand each chat message to the listener in its own task until the
/// stream closes, membership changes or shutdown is requested.
async fn forward_messages<R: RemoteVideoService + 'static>(
    listener: Arc<MessageListener<R>>,
    mut messages: mpsc::Receiver<ChatMessage>,
    changed: &Notify,
    shutdown: &CancellationToken,
) -> StreamEnd {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return StreamEnd::Shutdown,
            _ = changed.notified() => return StreamEnd::MembershipChanged,
            msg = messages.recv() => {
                let Some(msg) = msg else {
                    return StreamEnd::Closed;
                };
                let listener = listener.clone();
                tokio::spawn(async move { ingest(&listener, to_incoming(&msg)).await });
            }
        }
    }
}

async fn ingest<R: RemoteVideoService>(listener: &MessageListener<R>, message: IncomingMessage) {
    match listener.handle_message(&message).await {
        Ok(report) if !report.is_empty() => {
            tracing::info!(
                channel_id = %message.channel_id,
                author = %message.author,
                created = report.created.len(),
                skipped = report.skipped.len(),
                failed = report.failed.len(),
                "Chat links mirrored"
            );
        }
        Ok(_) => {}
        Err(e @ IngestError::CacheDesync(_)) => {
            tracing::error!(channel_id = %message.channel_id, "{e}");
        }
        Err(e) => {
            tracing::warn!(channel_id = %message.channel_id, "Chat message ingestion failed: {e}");
        }
    }
}

fn to_incoming(msg: &ChatMessage) -> IncomingMessage {
    IncomingMessage {
        channel_id: msg.broadcaster_user_id.clone(),
        author: msg.chatter_user_login.clone(),
        body: msg.text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_db::Database;

    use crate::reconcile::Reconciler;
    use crate::reconcile::testing::FakeRemote;
    use crate::watch::{WatchMembership, WatchService};

    fn chat(channel: &str, text: &str) -> ChatMessage {
        ChatMessage {
            message_id: "m1".into(),
            broadcaster_user_id: channel.into(),
            broadcaster_user_login: "streamer".into(),
            chatter_user_id: "77".into(),
            chatter_user_login: "viewer".into(),
            text: text.into(),
        }
    }

    #[test]
    fn test_chat_message_maps_to_channel() {
        let incoming = to_incoming(&chat("1971641", "hello"));
        assert_eq!(incoming.channel_id, "1971641");
        assert_eq!(incoming.author, "viewer");
        assert_eq!(incoming.body, "hello");
    }

    #[test]
    fn test_twitch_token_conversion_keeps_every_field() {
        let stored = mirror_db::tokens::Token {
            access_token: "acc".into(),
            refresh_token: "ref".into(),
            scope: "user:read:chat user:bot".into(),
            expires_at: 1_700_000_000,
        };
        let client = to_twitch_token(&stored);
        assert_eq!(client.access_token, "acc");
        assert_eq!(client.refresh_token, "ref");
        assert_eq!(client.scope, "user:read:chat user:bot");
        assert_eq!(client.expires_at, 1_700_000_000);
        let back = twitch_to_db_token(&client);
        assert_eq!(back.access_token, stored.access_token);
        assert_eq!(back.refresh_token, stored.refresh_token);
        assert_eq!(back.scope, stored.scope);
        assert_eq!(back.expires_at, stored.expires_at);
    }

    #[tokio::test]
    async fn test_forward_messages_ingests_until_closed() {
        let db = Database::open_in_memory().unwrap();
        let membership = Arc::new(WatchMembership::new());
        membership.initialize(&db).unwrap();
        WatchService::new(db.clone())
            .with_observer(membership.clone())
            .watch("1971641", "general")
            .unwrap();
        let reconciler = Arc::new(Reconciler::new(db.clone(), FakeRemote::new()));
        let listener = Arc::new(MessageListener::new(membership, reconciler.clone()));

        let (tx, rx) = mpsc::channel(4);
        tx.send(chat("1971641", "https://www.youtube.com/watch?v=abc123"))
            .await
            .unwrap();
        drop(tx);

        let changed = Notify::new();
        let shutdown = CancellationToken::new();
        let end = forward_messages(listener, rx, &changed, &shutdown).await;
        assert!(matches!(end, StreamEnd::Closed));

        // Ingestion runs in a spawned task.
        for _ in 0..100 {
            if reconciler.remote().create_count() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let playlist = db.get_playlist_by_name("general").unwrap().unwrap();
        assert_eq!(playlist.youtube_playlist_id.as_deref(), Some("PL1"));
        assert_eq!(db.get_playlist_songs(playlist.id).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_forward_messages_stops_on_membership_change() {
        let db = Database::open_in_memory().unwrap();
        let membership = Arc::new(WatchMembership::new());
        let reconciler = Arc::new(Reconciler::new(db, FakeRemote::new()));
        let listener = Arc::new(MessageListener::new(membership, reconciler));

        let (_tx, rx) = mpsc::channel(4);
        let changed = Notify::new();
        changed.notify_one();
        let end = forward_messages(listener, rx, &changed, &CancellationToken::new()).await;
        assert!(matches!(end, StreamEnd::MembershipChanged));
    }
}
