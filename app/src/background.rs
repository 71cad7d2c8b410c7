//! Background task loops: OAuth token refresh for YouTube and Twitch.

use std::time::Duration;

use mirror_db::tokens::{PROVIDER_TWITCH, PROVIDER_YOUTUBE, Token};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use twitch_client::auth::TwitchAuth;
use youtube_client::auth::YouTubeAuth;

use crate::app::SharedState;
use crate::chat_bridge::twitch_to_db_token;
use crate::config::AppConfig;
use crate::reconcile::to_db_token;

/// Refresh tokens that expire within this many seconds.
const REFRESH_WINDOW_SECS: i64 = 30 * 60;

pub(crate) async fn sleep_or_cancel(token: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        _ = token.cancelled() => true,
        _ = sleep(duration) => false,
    }
}

/// Periodically check and refresh the stored OAuth tokens.
pub async fn token_refresh_loop<R>(state: SharedState<R>) {
    const CHECK_INTERVAL_SECS: u64 = 10 * 60;
    const INITIAL_BACKOFF_SECS: u64 = 30;
    const MAX_BACKOFF_SECS: u64 = 30 * 60;
    let shutdown_token = state.shutdown_token().clone();

    // Wait for initial startup
    if sleep_or_cancel(&shutdown_token, Duration::from_secs(10)).await {
        tracing::info!("Token refresh loop stopped (shutdown)");
        return;
    }
    let mut failure_backoff_secs = INITIAL_BACKOFF_SECS;

    loop {
        let mut failed = false;
        for provider in [PROVIDER_YOUTUBE, PROVIDER_TWITCH] {
            if let Err(e) = refresh_if_expiring(&state, provider).await {
                tracing::error!(provider, "Token auto-refresh failed: {e}");
                failed = true;
            }
        }

        let wait = if failed {
            tracing::warn!(
                retry_after_secs = failure_backoff_secs,
                "Retrying token refresh with exponential backoff"
            );
            let wait = failure_backoff_secs;
            failure_backoff_secs = (failure_backoff_secs * 2).min(MAX_BACKOFF_SECS);
            wait
        } else {
            failure_backoff_secs = INITIAL_BACKOFF_SECS;
            CHECK_INTERVAL_SECS
        };

        if sleep_or_cancel(&shutdown_token, Duration::from_secs(wait)).await {
            tracing::info!("Token refresh loop stopped (shutdown)");
            return;
        }
    }
}

/// Refresh one provider's stored token when it is close to expiry.
/// Missing tokens and unconfigured providers are not failures.
async fn refresh_if_expiring<R>(state: &SharedState<R>, provider: &str) -> Result<(), String> {
    let db_token = match state.db().get_latest_token(provider) {
        Ok(Some(t)) => t,
        Ok(None) => return Ok(()),
        Err(e) => return Err(format!("failed to load token from DB: {e}")),
    };

    let time_until_expiry = db_token.expires_at - chrono::Utc::now().timestamp();
    if time_until_expiry > REFRESH_WINDOW_SECS {
        return Ok(());
    }
    if db_token.refresh_token.is_empty() {
        return Err("no refresh token stored; re-authorization required".into());
    }

    tracing::info!(provider, time_until_expiry, "Token expiring soon or expired, refreshing");

    let config = state.config().await.clone();
    let refreshed = match provider {
        PROVIDER_YOUTUBE => refresh_youtube(&config, &db_token).await?,
        _ => refresh_twitch(&config, &db_token).await?,
    };
    let Some(refreshed) = refreshed else {
        return Ok(());
    };

    state
        .db()
        .save_token(provider, &refreshed)
        .map_err(|e| format!("failed to save refreshed token: {e}"))?;
    tracing::info!(provider, expires_at = refreshed.expires_at, "Token auto-refreshed successfully");
    Ok(())
}

async fn refresh_youtube(config: &AppConfig, current: &Token) -> Result<Option<Token>, String> {
    if !config.youtube_configured() {
        return Ok(None);
    }
    let auth = YouTubeAuth::new(
        config.youtube_client_id.clone(),
        config.youtube_client_secret.clone(),
        config.youtube_redirect_uri(),
    );
    let t = auth
        .refresh_token(&current.refresh_token)
        .await
        .map_err(|e| e.to_string())?;
    Ok(Some(to_db_token(&t)))
}

async fn refresh_twitch(config: &AppConfig, current: &Token) -> Result<Option<Token>, String> {
    if config.twitch_client_id.is_empty() || config.twitch_client_secret.is_empty() {
        return Ok(None);
    }
    let auth = TwitchAuth::new(
        config.twitch_client_id.clone(),
        config.twitch_client_secret.clone(),
        config.twitch_redirect_uri(),
    );
    let t = auth
        .refresh_token(&current.refresh_token)
        .await
        .map_err(|e| e.to_string())?;
    Ok(Some(twitch_to_db_token(&t)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sleep_or_cancel_returns_on_cancel() {
        let token = CancellationToken::new();
        token.cancel();
        assert!(sleep_or_cancel(&token, Duration::from_secs(3600)).await);
    }

    #[tokio::test]
    async fn test_sleep_or_cancel_elapses() {
        let token = CancellationToken::new();
        assert!(!sleep_or_cancel(&token, Duration::from_millis(1)).await);
    }
}
