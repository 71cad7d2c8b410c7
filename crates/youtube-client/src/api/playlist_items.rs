use super::playlists::encode;
use super::*;

impl YouTubeApiClient {
    /// Append a video to a playlist. Returns the new playlist item id, if any.
    pub async fn insert_playlist_item(
        &self,
        token: &Token,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<Option<String>, YouTubeError> {
        let url = self.url("playlistItems?part=snippet");
        let body = PlaylistItemResource {
            id: None,
            snippet: PlaylistItemSnippet {
                playlist_id: playlist_id.to_string(),
                resource_id: ResourceId {
                    kind: "youtube#video".into(),
                    video_id: video_id.to_string(),
                },
            },
        };
        let resp = self.authenticated_post(&url, token, &body).await?;
        let created: PlaylistItemResource = serde_json::from_str(&resp)?;
        Ok(created.id)
    }

    /// Remove an item from its playlist.
    pub async fn delete_playlist_item(&self, token: &Token, item_id: &str) -> Result<(), YouTubeError> {
        let url = self.url(&format!("playlistItems?id={}", encode(item_id)));
        self.authenticated_delete(&url, token).await
    }
}
