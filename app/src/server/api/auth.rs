//! OAuth flows for the YouTube owner account and the Twitch chat reader.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, Redirect};
use mirror_db::tokens::{PROVIDER_TWITCH, PROVIDER_YOUTUBE};
use serde::Deserialize;
use serde_json::{Value, json};
use twitch_client::auth::TwitchAuth;
use uuid::Uuid;
use youtube_client::auth::YouTubeAuth;

use crate::app::SharedState;
use crate::chat_bridge::twitch_to_db_token;
use crate::reconcile::{RemoteVideoService, to_db_token};

use super::{ApiResult, err_json, map_db_error};

type HtmlResult = Result<Html<String>, (StatusCode, Json<Value>)>;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

async fn youtube_client_auth<R>(state: &SharedState<R>) -> Result<YouTubeAuth, (StatusCode, Json<Value>)> {
    let config = state.config().await;
    if !config.youtube_configured() {
        return Err(err_json(400, "YouTube credentials not configured"));
    }
    Ok(YouTubeAuth::new(
        config.youtube_client_id.clone(),
        config.youtube_client_secret.clone(),
        config.youtube_redirect_uri(),
    ))
}

async fn twitch_client_auth<R>(state: &SharedState<R>) -> Result<TwitchAuth, (StatusCode, Json<Value>)> {
    let config = state.config().await;
    if config.twitch_client_id.is_empty() || config.twitch_client_secret.is_empty() {
        return Err(err_json(400, "Twitch credentials not configured"));
    }
    Ok(TwitchAuth::new(
        config.twitch_client_id.clone(),
        config.twitch_client_secret.clone(),
        config.twitch_redirect_uri(),
    ))
}

/// Validate the callback query against the pending state and return the code.
async fn verify_callback<R>(
    state: &SharedState<R>,
    provider: &'static str,
    q: CallbackQuery,
) -> Result<Result<String, Html<String>>, (StatusCode, Json<Value>)> {
    if let Some(error) = q.error {
        let desc = q.error_description.unwrap_or_default();
        tracing::warn!(provider, error = %error, "OAuth authorization denied");
        return Ok(Err(result_page("Authorization failed", &format!("{error}: {desc}"))));
    }
    let code = q
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| err_json(400, "OAuth code missing"))?;
    let callback_state = q
        .state
        .filter(|s| !s.is_empty())
        .ok_or_else(|| err_json(400, "OAuth state missing"))?;
    let expected_state = state
        .take_oauth_state(provider)
        .await
        .ok_or_else(|| err_json(400, "OAuth state not initialized"))?;
    if callback_state != expected_state {
        return Err(err_json(400, "OAuth state mismatch"));
    }
    Ok(Ok(code))
}

fn result_page(title: &str, detail: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html><html><body><h2>{title}</h2><p>{detail}</p>
<script>setTimeout(()=>window.close(),3000)</script></body></html>"#
    ))
}

/// GET /api/auth/status
pub async fn auth_status<R: RemoteVideoService + 'static>(
    State(state): State<SharedState<R>>,
) -> ApiResult {
    let youtube = state
        .db()
        .get_latest_token(PROVIDER_YOUTUBE)
        .map_err(map_db_error)?;
    let twitch = state
        .db()
        .get_latest_token(PROVIDER_TWITCH)
        .map_err(map_db_error)?;
    Ok(Json(json!({
        "youtube": {
            "authenticated": youtube.is_some(),
            "expiresAt": youtube.as_ref().map(|t| t.expires_at),
        },
        "twitch": {
            "authenticated": twitch.is_some(),
            "expiresAt": twitch.as_ref().map(|t| t.expires_at),
        },
    })))
}

/// GET /auth/youtube – Redirect to Google consent
pub async fn youtube_auth<R: RemoteVideoService + 'static>(
    State(state): State<SharedState<R>>,
) -> Result<Redirect, (StatusCode, Json<Value>)> {
    let auth = youtube_client_auth(&state).await?;
    let oauth_state = Uuid::new_v4().to_string();
    state.set_oauth_state(PROVIDER_YOUTUBE, oauth_state.clone()).await;
    let url = auth
        .get_auth_url_with_state(Some(&oauth_state))
        .map_err(|e| err_json(500, &e.to_string()))?;
    Ok(Redirect::temporary(&url))
}

/// GET /callback/youtube – Exchange the code and store the token.
pub async fn youtube_callback<R: RemoteVideoService + 'static>(
    State(state): State<SharedState<R>>,
    Query(q): Query<CallbackQuery>,
) -> HtmlResult {
    let code = match verify_callback(&state, PROVIDER_YOUTUBE, q).await? {
        Ok(code) => code,
        Err(page) => return Ok(page),
    };
    let auth = youtube_client_auth(&state).await?;
    let token = auth
        .exchange_code(&code)
        .await
        .map_err(|e| err_json(502, &e.to_string()))?;
    let db_token = to_db_token(&token);
    state
        .db()
        .save_token(PROVIDER_YOUTUBE, &db_token)
        .map_err(map_db_error)?;
    tracing::info!(expires_at = db_token.expires_at, "YouTube OAuth token saved");

    Ok(result_page("YouTube connected", "You can close this window."))
}

/// GET /auth/twitch – Redirect to Twitch consent
pub async fn twitch_auth<R: RemoteVideoService + 'static>(
    State(state): State<SharedState<R>>,
) -> Result<Redirect, (StatusCode, Json<Value>)> {
    let auth = twitch_client_auth(&state).await?;
    let oauth_state = Uuid::new_v4().to_string();
    state.set_oauth_state(PROVIDER_TWITCH, oauth_state.clone()).await;
    let url = auth
        .get_auth_url_with_state(Some(&oauth_state))
        .map_err(|e| err_json(500, &e.to_string()))?;
    Ok(Redirect::temporary(&url))
}

/// GET /callback/twitch – Exchange the code, store the token and wake the chat bridge.
pub async fn twitch_callback<R: RemoteVideoService + 'static>(
    State(state): State<SharedState<R>>,
    Query(q): Query<CallbackQuery>,
) -> HtmlResult {
    let code = match verify_callback(&state, PROVIDER_TWITCH, q).await? {
        Ok(code) => code,
        Err(page) => return Ok(page),
    };
    let auth = twitch_client_auth(&state).await?;
    let token = auth
        .exchange_code(&code)
        .await
        .map_err(|e| err_json(502, &e.to_string()))?;
    let db_token = twitch_to_db_token(&token);
    state
        .db()
        .save_token(PROVIDER_TWITCH, &db_token)
        .map_err(map_db_error)?;
    tracing::info!(expires_at = db_token.expires_at, "Twitch OAuth token saved");
    state.chat_changed().notify_one();

    Ok(result_page("Twitch connected", "You can close this window."))
}
