//! OAuth for the account that reads chat.
//!
//! Twitch rotates refresh tokens on every refresh, so the token returned
//! here always replaces the stored one.

use chrono::Utc;
use serde::Deserialize;
use url::Url;

use crate::{SCOPES, Token, TwitchError};

const AUTHORIZE_URL: &str = "https://id.twitch.tv/oauth2/authorize";
const TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";

/// Refresh when the token expires within this many seconds.
const REFRESH_MARGIN_SECS: i64 = 30 * 60;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    scope: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(alias = "status")]
    error: Option<serde_json::Value>,
    #[serde(alias = "message")]
    error_description: Option<String>,
}

/// Manages Twitch OAuth authentication.
///
/// The caller is responsible for persisting tokens.
pub struct TwitchAuth {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    http: reqwest::Client,
}

impl TwitchAuth {
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            http: reqwest::Client::new(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Generate the OAuth authorization URL, optionally carrying a CSRF state.
    pub fn get_auth_url_with_state(&self, state: Option<&str>) -> Result<String, TwitchError> {
        let scope_str = SCOPES.join(" ");
        let mut url = Url::parse(AUTHORIZE_URL)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("response_type", "code")
                .append_pair("client_id", &self.client_id)
                .append_pair("redirect_uri", &self.redirect_uri)
                .append_pair("scope", &scope_str)
                .append_pair("force_verify", "true");
            if let Some(state) = state {
                pairs.append_pair("state", state);
            }
        }
        Ok(url.to_string())
    }

    /// Exchange an authorization code for access and refresh tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<Token, TwitchError> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];

        let resp = self.http.post(TOKEN_URL).form(&params).send().await?;
        parse_token_response(resp).await
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> Result<Token, TwitchError> {
        tracing::info!("Refreshing Twitch OAuth token");

        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let resp = self.http.post(TOKEN_URL).form(&params).send().await?;
        parse_token_response(resp).await
    }

    /// Get a valid token, refreshing if it expires within 30 minutes.
    ///
    /// `Ok(Some(token))` means a refresh happened and the caller must persist it.
    pub async fn get_or_refresh_token(
        &self,
        current: &Token,
    ) -> Result<Option<Token>, TwitchError> {
        let now = Utc::now().timestamp();
        if !needs_refresh(current, now) {
            return Ok(None);
        }

        if current.refresh_token.is_empty() {
            return Err(TwitchError::AuthRequired);
        }

        tracing::info!(
            expires_in_secs = current.expires_at - now,
            "Twitch token expiring soon, refreshing"
        );

        let new_token = self.refresh_token(&current.refresh_token).await?;
        Ok(Some(new_token))
    }
}

pub(crate) fn needs_refresh(token: &Token, now: i64) -> bool {
    now >= token.expires_at - REFRESH_MARGIN_SECS
}

async fn parse_token_response(resp: reqwest::Response) -> Result<Token, TwitchError> {
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        let detail = match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(err) => format!(
                "{}: {}",
                err.error.map(|e| e.to_string()).unwrap_or_default(),
                err.error_description.unwrap_or_default()
            ),
            Err(_) => format!("{status}: {body}"),
        };
        return Err(TwitchError::TokenRefreshFailed(detail));
    }

    let token_resp: TokenResponse = serde_json::from_str(&body)
        .map_err(|e| TwitchError::TokenRefreshFailed(format!("failed to parse response: {e}")))?;

    Ok(token_from_response(token_resp, Utc::now().timestamp()))
}

fn token_from_response(resp: TokenResponse, now: i64) -> Token {
    let scope = resp
        .scope
        .map(|s| s.join(" "))
        .unwrap_or_else(|| SCOPES.join(" "));
    Token {
        access_token: resp.access_token,
        refresh_token: resp.refresh_token,
        scope,
        expires_at: now + resp.expires_in,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_url_generation() {
        let auth = TwitchAuth::new(
            "test_client_id".into(),
            "test_secret".into(),
            "http://localhost:8080/callback/twitch".into(),
        );
        let url = auth.get_auth_url_with_state(None).unwrap();

        assert!(url.starts_with(AUTHORIZE_URL));
        assert!(url.contains("client_id=test_client_id"));
        assert!(url.contains("force_verify=true"));
        assert!(url.contains("scope=user%3Aread%3Achat"));
        assert!(!url.contains("state="));
    }

    #[test]
    fn test_token_scope_joined() {
        let resp = TokenResponse {
            access_token: "a".into(),
            refresh_token: "r2".into(),
            expires_in: 100,
            scope: Some(vec!["user:read:chat".into(), "user:bot".into()]),
        };
        let token = token_from_response(resp, 50);
        assert_eq!(token.scope, "user:read:chat user:bot");
        assert_eq!(token.refresh_token, "r2");
        assert_eq!(token.expires_at, 150);
    }

    #[test]
    fn test_needs_refresh_margin() {
        let token = Token {
            access_token: "abc".into(),
            refresh_token: "def".into(),
            scope: String::new(),
            expires_at: 100_000,
        };
        assert!(!needs_refresh(&token, 100_000 - REFRESH_MARGIN_SECS - 1));
        assert!(needs_refresh(&token, 100_000 - REFRESH_MARGIN_SECS));
    }

    #[test]
    fn test_get_or_refresh_expired_without_refresh_token() {
        let auth = TwitchAuth::new("id".into(), "secret".into(), "http://localhost".into());
        let token = Token {
            access_token: "abc".into(),
            refresh_token: String::new(),
            scope: String::new(),
            expires_at: 0,
        };

        let rt = tokio::runtime::Runtime::new().unwrap();
        let result = rt.block_on(auth.get_or_refresh_token(&token));
        assert!(matches!(result, Err(TwitchError::AuthRequired)));
    }
}
