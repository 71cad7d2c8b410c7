use std::collections::HashMap;
use std::sync::Arc;

use mirror_db::Database;
use tokio::sync::{Mutex, Notify, RwLock};
use tokio_util::sync::CancellationToken;
use youtube_client::auth::YouTubeAuth;

use crate::config::AppConfig;
use crate::ingest::MessageListener;
use crate::reconcile::{Reconciler, RemoteVideoService, YouTubeRemote};
use crate::watch::{WatchMembership, WatchObserver, WatchService};

/// Application shared state accessible from axum handlers and background tasks.
pub struct SharedState<R = YouTubeRemote> {
    inner: Arc<SharedStateInner<R>>,
}

impl<R> Clone for SharedState<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct SharedStateInner<R> {
    /// Application configuration
    config: RwLock<AppConfig>,
    db: Database,
    shutdown: CancellationToken,
    membership: Arc<WatchMembership>,
    watch: WatchService,
    reconciler: Arc<Reconciler<R>>,
    listener: Arc<MessageListener<R>>,
    /// Pending OAuth CSRF state per provider
    oauth_states: Mutex<HashMap<&'static str, String>>,
    /// Signalled whenever the set of watched channels changes
    chat_changed: Arc<Notify>,
}

/// Wakes the chat bridge so it resubscribes to the new channel set.
struct ChatResubscribe(Arc<Notify>);

impl WatchObserver for ChatResubscribe {
    fn on_watch_started(&self, channel_id: &str) {
        tracing::debug!(channel_id, "Watch started; resubscribing chat");
        self.0.notify_one();
    }

    fn on_watch_stopped(&self, channel_id: &str) {
        tracing::debug!(channel_id, "Watch stopped; resubscribing chat");
        self.0.notify_one();
    }
}

impl SharedState<YouTubeRemote> {
    /// Create shared state backed by the YouTube Data API.
    pub fn new(
        db: Database,
        config: AppConfig,
        membership: Arc<WatchMembership>,
    ) -> Self {
        let auth = YouTubeAuth::new(
            config.youtube_client_id.clone(),
            config.youtube_client_secret.clone(),
            config.youtube_redirect_uri(),
        );
        let remote = YouTubeRemote::new(db.clone(), auth, config.playlist_privacy);
        Self::with_remote(db, config, membership, remote)
    }
}

impl<R: RemoteVideoService> SharedState<R> {
    pub fn with_remote(
        db: Database,
        config: AppConfig,
        membership: Arc<WatchMembership>,
        remote: R,
    ) -> Self {
        let chat_changed = Arc::new(Notify::new());
        let watch = WatchService::new(db.clone())
            .with_observer(membership.clone())
            .with_observer(Arc::new(ChatResubscribe(chat_changed.clone())));
        let reconciler = Arc::new(Reconciler::new(db.clone(), remote));
        let listener = Arc::new(MessageListener::new(membership.clone(), reconciler.clone()));

        Self {
            inner: Arc::new(SharedStateInner {
                config: RwLock::new(config),
                db,
                shutdown: CancellationToken::new(),
                membership,
                watch,
                reconciler,
                listener,
                oauth_states: Mutex::new(HashMap::new()),
                chat_changed,
            }),
        }
    }

    pub fn reconciler(&self) -> &Reconciler<R> {
        &self.inner.reconciler
    }

    pub fn listener(&self) -> Arc<MessageListener<R>> {
        self.inner.listener.clone()
    }
}

impl<R> SharedState<R> {
    pub fn server_port(&self) -> u16 {
        // Read from config; fallback to 8080.
        self.inner
            .config
            .try_read()
            .map(|c| c.server_port)
            .unwrap_or(8080)
    }

    pub fn db(&self) -> &Database {
        &self.inner.db
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.inner.shutdown
    }

    pub fn membership(&self) -> &Arc<WatchMembership> {
        &self.inner.membership
    }

    pub fn watch(&self) -> &WatchService {
        &self.inner.watch
    }

    pub fn chat_changed(&self) -> Arc<Notify> {
        self.inner.chat_changed.clone()
    }

    /// Get a read lock on the current config.
    pub async fn config(&self) -> tokio::sync::RwLockReadGuard<'_, AppConfig> {
        self.inner.config.read().await
    }

    pub async fn set_oauth_state(&self, provider: &'static str, value: String) {
        self.inner.oauth_states.lock().await.insert(provider, value);
    }

    /// Take the pending state for `provider`; each state is usable once.
    pub async fn take_oauth_state(&self, provider: &str) -> Option<String> {
        self.inner.oauth_states.lock().await.remove(provider)
    }
}
