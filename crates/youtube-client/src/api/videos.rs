use super::playlists::encode;
use super::*;

impl YouTubeApiClient {
    /// Whether a video with this id exists and is visible to the caller.
    pub async fn video_exists(&self, token: &Token, video_id: &str) -> Result<bool, YouTubeError> {
        let url = self.url(&format!("videos?part=id&id={}", encode(video_id)));
        let body = self.authenticated_get(&url, token).await?;
        let resp: ListResponse<VideoResource> = serde_json::from_str(&body)?;
        Ok(resp.items.iter().any(|v| v.id == video_id))
    }
}
