use super::*;

impl YouTubeApiClient {
    /// Create a playlist. Returns the new playlist id, if the response carried one.
    pub async fn create_playlist(
        &self,
        token: &Token,
        title: &str,
        privacy: PrivacyStatus,
    ) -> Result<Option<String>, YouTubeError> {
        let url = self.url("playlists?part=snippet,status");
        let body = PlaylistResource {
            id: None,
            snippet: PlaylistSnippet {
                title: title.to_string(),
                description: None,
            },
            status: Some(PlaylistStatus {
                privacy_status: privacy,
            }),
        };
        let resp = self.authenticated_post(&url, token, &body).await?;
        let created: PlaylistResource = serde_json::from_str(&resp)?;
        tracing::debug!(title, id = ?created.id, "YouTube playlist inserted");
        Ok(created.id)
    }

    /// Delete a playlist by id.
    pub async fn delete_playlist(&self, token: &Token, playlist_id: &str) -> Result<(), YouTubeError> {
        let url = self.url(&format!("playlists?id={}", encode(playlist_id)));
        self.authenticated_delete(&url, token).await
    }
}

pub(super) fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
