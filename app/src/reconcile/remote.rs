use std::future::Future;

use mirror_db::Database;
use mirror_db::tokens::PROVIDER_YOUTUBE;
use tokio::sync::Mutex;
use youtube_client::api::{PrivacyStatus, YouTubeApiClient};
use youtube_client::auth::YouTubeAuth;
use youtube_client::{Token, YouTubeError};

use super::{RemoteError, RemoteVideoService};

/// [`RemoteVideoService`] backed by the YouTube Data API, using the
/// OAuth token stored in the database.
pub struct YouTubeRemote {
    db: Database,
    api: YouTubeApiClient,
    auth: YouTubeAuth,
    privacy: PrivacyStatus,
    refresh_lock: Mutex<()>,
}

pub(crate) fn to_client_token(t: &mirror_db::tokens::Token) -> Token {
    Token {
        access_token: t.access_token.clone(),
        refresh_token: t.refresh_token.clone(),
        scope: t.scope.clone(),
        expires_at: t.expires_at,
    }
}

pub(crate) fn to_db_token(t: &Token) -> mirror_db::tokens::Token {
    mirror_db::tokens::Token {
        access_token: t.access_token.clone(),
        refresh_token: t.refresh_token.clone(),
        scope: t.scope.clone(),
        expires_at: t.expires_at,
    }
}

impl YouTubeRemote {
    pub fn new(db: Database, auth: YouTubeAuth, privacy: PrivacyStatus) -> Self {
        Self {
            db,
            api: YouTubeApiClient::new(),
            auth,
            privacy,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Stored token, refreshed first when close to expiry.
    async fn valid_token(&self) -> Result<Token, RemoteError> {
        let _guard = self.refresh_lock.lock().await;
        let stored = self
            .db
            .get_latest_token(PROVIDER_YOUTUBE)?
            .ok_or(RemoteError::NotConnected)?;
        let current = to_client_token(&stored);
        match self.auth.get_or_refresh_token(&current).await? {
            Some(refreshed) => {
                self.db.save_token(PROVIDER_YOUTUBE, &to_db_token(&refreshed))?;
                tracing::info!(expires_at = refreshed.expires_at, "YouTube token refreshed");
                Ok(refreshed)
            }
            None => Ok(current),
        }
    }

    /// Refresh after a 401, unless another caller already rotated the token.
    async fn force_refresh(&self, stale: &Token) -> Result<Token, RemoteError> {
        let _guard = self.refresh_lock.lock().await;
        if let Some(latest) = self.db.get_latest_token(PROVIDER_YOUTUBE)? {
            if latest.access_token != stale.access_token {
                return Ok(to_client_token(&latest));
            }
        }
        let refreshed = self.auth.refresh_token(&stale.refresh_token).await?;
        self.db.save_token(PROVIDER_YOUTUBE, &to_db_token(&refreshed))?;
        Ok(refreshed)
    }

    /// Run an API call, retrying once with a fresh token on 401.
    async fn call<T, F, Fut>(&self, f: F) -> Result<T, RemoteError>
    where
        F: Fn(Token) -> Fut,
        Fut: Future<Output = Result<T, YouTubeError>>,
    {
        let token = self.valid_token().await?;
        match f(token.clone()).await {
            Err(e) if e.is_unauthorized() && !token.refresh_token.is_empty() => {
                tracing::warn!("YouTube returned 401; refreshing token and retrying");
                let token = self.force_refresh(&token).await?;
                Ok(f(token).await?)
            }
            other => Ok(other?),
        }
    }
}

impl RemoteVideoService for YouTubeRemote {
    async fn create_playlist(&self, name: &str) -> Result<Option<String>, RemoteError> {
        let (api, privacy) = (&self.api, self.privacy);
        self.call(|token| async move { api.create_playlist(&token, name, privacy).await })
            .await
    }

    async fn delete_playlist(&self, playlist_id: &str) -> Result<(), RemoteError> {
        let api = &self.api;
        self.call(|token| async move { api.delete_playlist(&token, playlist_id).await })
            .await
    }

    async fn create_playlist_item(
        &self,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<Option<String>, RemoteError> {
        let api = &self.api;
        self.call(|token| async move { api.insert_playlist_item(&token, playlist_id, video_id).await })
            .await
    }

    async fn delete_playlist_item(&self, item_id: &str) -> Result<(), RemoteError> {
        let api = &self.api;
        self.call(|token| async move { api.delete_playlist_item(&token, item_id).await })
            .await
    }

    async fn resolve_video_id(&self, url: &str) -> Result<Option<String>, RemoteError> {
        let Some(video_id) = youtube_client::parse_video_id(url) else {
            return Ok(None);
        };
        let api = &self.api;
        let id = video_id.as_str();
        let exists = self
            .call(|token| async move { api.video_exists(&token, id).await })
            .await?;
        if !exists {
            tracing::debug!(url, video_id = %video_id, "URL parsed but video not found");
        }
        Ok(exists.then_some(video_id))
    }
}
