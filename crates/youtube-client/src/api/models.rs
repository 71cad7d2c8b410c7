use serde::{Deserialize, Serialize};

/// Wrapper for YouTube list responses.
#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default, rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyStatus {
    Public,
    Unlisted,
    Private,
}

impl PrivacyStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Some(Self::Public),
            "unlisted" => Some(Self::Unlisted),
            "private" => Some(Self::Private),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistSnippet {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistStatus {
    pub privacy_status: PrivacyStatus,
}

/// Playlist resource from playlists.insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub snippet: PlaylistSnippet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PlaylistStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceId {
    pub kind: String,
    pub video_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemSnippet {
    pub playlist_id: String,
    pub resource_id: ResourceId,
}

/// Playlist item resource from playlistItems.insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistItemResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub snippet: PlaylistItemSnippet,
}

/// Video resource from videos.list (part=id).
#[derive(Debug, Clone, Deserialize)]
pub struct VideoResource {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playlist_insert_body_shape() {
        let body = PlaylistResource {
            id: None,
            snippet: PlaylistSnippet {
                title: "general".into(),
                description: None,
            },
            status: Some(PlaylistStatus {
                privacy_status: PrivacyStatus::Unlisted,
            }),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "snippet": { "title": "general" },
                "status": { "privacyStatus": "unlisted" }
            })
        );
    }

    #[test]
    fn test_playlist_item_response_parse() {
        let raw = r#"{
            "kind": "youtube#playlistItem",
            "id": "IT1",
            "snippet": {
                "playlistId": "PL1",
                "title": "ignored",
                "resourceId": { "kind": "youtube#video", "videoId": "abc123" }
            }
        }"#;
        let item: PlaylistItemResource = serde_json::from_str(raw).unwrap();
        assert_eq!(item.id.as_deref(), Some("IT1"));
        assert_eq!(item.snippet.resource_id.video_id, "abc123");
    }

    #[test]
    fn test_video_list_empty() {
        let resp: ListResponse<VideoResource> =
            serde_json::from_str(r#"{"kind":"youtube#videoListResponse"}"#).unwrap();
        assert!(resp.items.is_empty());
    }

    #[test]
    fn test_privacy_parse() {
        assert_eq!(PrivacyStatus::parse("Private"), Some(PrivacyStatus::Private));
        assert_eq!(PrivacyStatus::parse("hidden"), None);
    }
}
