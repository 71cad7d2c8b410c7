//! YouTube Data API v3 client.
//!
//! Typed access to the playlist, playlist item and video endpoints
//! this application needs, with Bearer token injection.

mod playlist_items;
mod playlists;
mod request;
mod videos;

pub mod models;

pub use models::{
    ListResponse, PlaylistItemResource, PlaylistItemSnippet, PlaylistResource, PlaylistSnippet,
    PlaylistStatus, PrivacyStatus, ResourceId, VideoResource,
};

use crate::{Token, YouTubeError};

const DATA_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// YouTube Data API client with automatic auth header injection.
#[derive(Debug, Clone)]
pub struct YouTubeApiClient {
    pub(super) http: reqwest::Client,
    pub(super) base_url: String,
}
