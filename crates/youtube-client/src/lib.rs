//! YouTube integration client library.
//!
//! Provides Google OAuth authentication, a YouTube Data API v3 client
//! for playlists and playlist items, and offline video URL parsing.

pub mod api;
pub mod auth;
pub mod video_url;

use serde::{Deserialize, Serialize};

pub use video_url::parse_video_id;

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

/// Unified error type for the youtube-client crate.
#[derive(Debug, thiserror::Error)]
pub enum YouTubeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Authentication required: no valid token")]
    AuthRequired,

    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("YouTube API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl YouTubeError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, YouTubeError::ApiError { status: 401, .. } | YouTubeError::AuthRequired)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, YouTubeError::ApiError { status: 404, .. })
    }
}

/// OAuth scopes required by this application.
pub const SCOPES: &[&str] = &["https://www.googleapis.com/auth/youtube"];
