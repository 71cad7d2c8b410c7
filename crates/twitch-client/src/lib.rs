//! Twitch chat reader.
//!
//! Provides OAuth authentication for the reading account and an
//! EventSub WebSocket client that delivers chat messages from a set of
//! broadcaster channels.

pub mod auth;
pub mod chat;
pub mod eventsub;

use serde::{Deserialize, Serialize};

pub use chat::ChatMessage;

/// Token data for OAuth authentication.
///
/// The caller is responsible for persisting this (e.g. via mirror-db).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    pub scope: String,
    pub expires_at: i64,
}

/// Unified error type for the twitch-client crate.
#[derive(Debug, thiserror::Error)]
pub enum TwitchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Authentication required: no valid token")]
    AuthRequired,

    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("Twitch API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("EventSub error: {0}")]
    EventSub(String),

    #[error("Connection timeout")]
    Timeout,

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// OAuth scopes required to read chat through EventSub.
pub const SCOPES: &[&str] = &["user:read:chat"];
