//! Google OAuth token management for the YouTube Data API.
//!
//! Handles consent URL generation, authorization code exchange
//! and token refresh. Google omits the refresh token from refresh
//! responses, so the previous one is carried forward.

use chrono::Utc;
use serde::Deserialize;
use url::Url;

use crate::{SCOPES, Token, YouTubeError};

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Refresh when the token expires within this many seconds.
const REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// Google OAuth token response from the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: i64,
    #[serde(default)]
    scope: Option<String>,
}

/// Google OAuth error response.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
}

/// Manages Google OAuth authentication.
///
/// The caller is responsible for persisting tokens.
/// This struct does not depend on mirror-db directly.
pub struct YouTubeAuth {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    http: reqwest::Client,
}

impl YouTubeAuth {
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            http: reqwest::Client::new(),
        }
    }

    /// Generate the consent URL. Offline access is requested so a refresh token is issued.
    pub fn get_auth_url_with_state(&self, state: Option<&str>) -> Result<String, YouTubeError> {
        let scope_str = SCOPES.join(" ");
        let mut url = Url::parse(AUTHORIZE_URL)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("response_type", "code")
                .append_pair("client_id", &self.client_id)
                .append_pair("redirect_uri", &self.redirect_uri)
                .append_pair("scope", &scope_str)
                .append_pair("access_type", "offline")
                .append_pair("prompt", "consent");
            if let Some(state) = state {
                pairs.append_pair("state", state);
            }
        }
        Ok(url.to_string())
    }

    /// Exchange an authorization code for access and refresh tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<Token, YouTubeError> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];

        let resp = self.http.post(TOKEN_URL).form(&params).send().await?;
        let token = parse_token_response(resp, None).await?;
        if token.refresh_token.is_empty() {
            tracing::warn!("Google did not return a refresh token; re-consent will be needed on expiry");
        }
        Ok(token)
    }

    /// Refresh an expired token using the refresh token.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<Token, YouTubeError> {
        tracing::info!("Refreshing YouTube OAuth token");

        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let resp = self.http.post(TOKEN_URL).form(&params).send().await?;
        parse_token_response(resp, Some(refresh_token)).await
    }

    /// Get a valid token, refreshing if it expires within five minutes.
    ///
    /// Returns `Ok(None)` if the current token is still usable, or
    /// `Ok(Some(token))` when a refresh happened and must be persisted.
    pub async fn get_or_refresh_token(
        &self,
        current: &Token,
    ) -> Result<Option<Token>, YouTubeError> {
        if !needs_refresh(current, Utc::now().timestamp()) {
            return Ok(None);
        }

        if current.refresh_token.is_empty() {
            return Err(YouTubeError::AuthRequired);
        }

        let new_token = self.refresh_token(&current.refresh_token).await?;
        Ok(Some(new_token))
    }
}

pub(crate) fn needs_refresh(token: &Token, now: i64) -> bool {
    now >= token.expires_at - REFRESH_MARGIN_SECS
}

async fn parse_token_response(
    resp: reqwest::Response,
    previous_refresh_token: Option<&str>,
) -> Result<Token, YouTubeError> {
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        let err: ErrorResponse = serde_json::from_str(&body).unwrap_or(ErrorResponse {
            error: Some(status.to_string()),
            error_description: Some(body.clone()),
        });
        return Err(YouTubeError::TokenRefreshFailed(format!(
            "{}: {}",
            err.error.unwrap_or_default(),
            err.error_description.unwrap_or_default()
        )));
    }

    let token_resp: TokenResponse = serde_json::from_str(&body)
        .map_err(|e| YouTubeError::TokenRefreshFailed(format!("failed to parse response: {e}")))?;

    Ok(token_from_response(
        token_resp,
        previous_refresh_token,
        Utc::now().timestamp(),
    ))
}

fn token_from_response(resp: TokenResponse, previous_refresh_token: Option<&str>, now: i64) -> Token {
    let refresh_token = resp
        .refresh_token
        .filter(|t| !t.is_empty())
        .or_else(|| previous_refresh_token.map(str::to_string))
        .unwrap_or_default();

    Token {
        access_token: resp.access_token,
        refresh_token,
        scope: resp.scope.unwrap_or_else(|| SCOPES.join(" ")),
        expires_at: now + resp.expires_in,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_url_generation() {
        let auth = YouTubeAuth::new(
            "test_client_id".into(),
            "test_secret".into(),
            "http://localhost:8080/callback/youtube".into(),
        );
        let url = auth.get_auth_url_with_state(Some("xyz")).unwrap();

        assert!(url.starts_with(AUTHORIZE_URL));
        assert!(url.contains("client_id=test_client_id"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("state=xyz"));
        assert!(url.contains("https%3A%2F%2Fwww.googleapis.com%2Fauth%2Fyoutube"));
    }

    #[test]
    fn test_refresh_keeps_previous_refresh_token() {
        let resp = TokenResponse {
            access_token: "new".into(),
            refresh_token: None,
            expires_in: 3600,
            scope: None,
        };
        let token = token_from_response(resp, Some("old-refresh"), 1_000);
        assert_eq!(token.access_token, "new");
        assert_eq!(token.refresh_token, "old-refresh");
        assert_eq!(token.expires_at, 4_600);
        assert_eq!(token.scope, SCOPES.join(" "));
    }

    #[test]
    fn test_needs_refresh_margin() {
        let token = Token {
            access_token: "abc".into(),
            refresh_token: "def".into(),
            scope: String::new(),
            expires_at: 10_000,
        };
        assert!(!needs_refresh(&token, 10_000 - REFRESH_MARGIN_SECS - 1));
        assert!(needs_refresh(&token, 10_000 - REFRESH_MARGIN_SECS));
        assert!(needs_refresh(&token, 20_000));
    }

    #[test]
    fn test_get_or_refresh_still_valid() {
        let auth = YouTubeAuth::new("id".into(), "secret".into(), "http://localhost".into());
        let token = Token {
            access_token: "abc".into(),
            refresh_token: "def".into(),
            scope: String::new(),
            expires_at: Utc::now().timestamp() + 7200,
        };

        let rt = tokio::runtime::Runtime::new().unwrap();
        let result = rt.block_on(auth.get_or_refresh_token(&token)).unwrap();
        assert!(result.is_none(), "Should not refresh a valid token");
    }
}
