//! Playlist and song management API.

use axum::Json;
use axum::extract::{Path, Query, State};
use mirror_db::PlaylistKind;
use serde::Deserialize;
use serde_json::json;

use crate::app::SharedState;
use crate::reconcile::RemoteVideoService;

use super::{ApiResult, err_json, map_db_error, map_reconcile_error};

const SEARCH_LIMIT: u32 = 25;

#[derive(Debug, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SongRequest {
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// GET /api/playlists
pub async fn list_playlists<R: RemoteVideoService + 'static>(
    State(state): State<SharedState<R>>,
) -> ApiResult {
    let playlists = state.db().get_all_playlists().map_err(map_db_error)?;
    let count = playlists.len();
    Ok(Json(json!({ "playlists": playlists, "count": count })))
}

/// GET /api/playlist-search?q=
pub async fn search_playlists<R: RemoteVideoService + 'static>(
    State(state): State<SharedState<R>>,
    Query(q): Query<SearchQuery>,
) -> ApiResult {
    let names: Vec<String> = state
        .db()
        .search_playlists(q.q.trim(), SEARCH_LIMIT)
        .map_err(map_db_error)?
        .into_iter()
        .map(|p| p.name)
        .collect();
    Ok(Json(json!({ "names": names })))
}

/// POST /api/playlists
pub async fn create_playlist<R: RemoteVideoService + 'static>(
    State(state): State<SharedState<R>>,
    Json(body): Json<CreatePlaylistRequest>,
) -> ApiResult {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(err_json(400, "name is required"));
    }
    let playlist = state
        .reconciler()
        .create_playlist(name, PlaylistKind::Manual, None)
        .await
        .map_err(map_reconcile_error)?;
    Ok(Json(json!({ "status": "ok", "playlist": playlist })))
}

/// GET /api/playlists/{name}
pub async fn get_playlist<R: RemoteVideoService + 'static>(
    State(state): State<SharedState<R>>,
    Path(name): Path<String>,
) -> ApiResult {
    let playlist = state
        .db()
        .get_playlist_by_name(&name)
        .map_err(map_db_error)?
        .ok_or_else(|| err_json(404, &format!("playlist \"{name}\" not found")))?;
    let songs: Vec<_> = state
        .db()
        .get_playlist_songs(playlist.id)
        .map_err(map_db_error)?
        .into_iter()
        .map(|s| {
            json!({
                "video_id": s.youtube_video_id,
                "url": s.watch_url(),
                "linked": s.is_linked(),
            })
        })
        .collect();
    Ok(Json(json!({ "playlist": playlist, "songs": songs })))
}

/// DELETE /api/playlists/{name}
pub async fn delete_playlist<R: RemoteVideoService + 'static>(
    State(state): State<SharedState<R>>,
    Path(name): Path<String>,
) -> ApiResult {
    let playlist = state
        .db()
        .get_playlist_by_name(&name)
        .map_err(map_db_error)?
        .ok_or_else(|| err_json(404, &format!("playlist \"{name}\" not found")))?;
    state
        .reconciler()
        .delete_playlist(&playlist)
        .await
        .map_err(map_reconcile_error)?;
    Ok(Json(json!({ "status": "ok", "message": "Playlist deleted" })))
}

/// POST /api/playlist-sync
pub async fn sync_playlists<R: RemoteVideoService + 'static>(
    State(state): State<SharedState<R>>,
) -> ApiResult {
    let report = state
        .reconciler()
        .sync_all()
        .await
        .map_err(map_reconcile_error)?;
    Ok(Json(json!({ "status": "ok", "report": report })))
}

/// POST /api/playlists/{name}/songs
pub async fn add_song<R: RemoteVideoService + 'static>(
    State(state): State<SharedState<R>>,
    Path(name): Path<String>,
    Json(body): Json<SongRequest>,
) -> ApiResult {
    let playlist = state
        .db()
        .get_playlist_by_name(&name)
        .map_err(map_db_error)?
        .ok_or_else(|| err_json(404, &format!("playlist \"{name}\" not found")))?;
    if !playlist.is_synced() {
        return Err(err_json(
            400,
            &format!("playlist \"{name}\" is not synced with YouTube; run a sync first"),
        ));
    }

    let video_id = state
        .reconciler()
        .remote()
        .resolve_video_id(body.url.trim())
        .await
        .map_err(|e| err_json(502, &e.to_string()))?
        .ok_or_else(|| err_json(404, "no YouTube video found for that URL"))?;

    let song = state
        .reconciler()
        .create_song(&playlist, &video_id)
        .await
        .map_err(map_reconcile_error)?;
    Ok(Json(json!({ "status": "ok", "song": song, "url": song.watch_url() })))
}

/// DELETE /api/playlists/{name}/songs
pub async fn remove_song<R: RemoteVideoService + 'static>(
    State(state): State<SharedState<R>>,
    Path(name): Path<String>,
    Json(body): Json<SongRequest>,
) -> ApiResult {
    let playlist = state
        .db()
        .get_playlist_by_name(&name)
        .map_err(map_db_error)?
        .ok_or_else(|| err_json(404, &format!("playlist \"{name}\" not found")))?;
    let video_id = youtube_client::parse_video_id(body.url.trim())
        .ok_or_else(|| err_json(404, "no YouTube video found for that URL"))?;
    let song = state
        .db()
        .get_song_by_video_id(playlist.id, &video_id)
        .map_err(map_db_error)?
        .ok_or_else(|| err_json(404, &format!("video {video_id} is not in playlist \"{name}\"")))?;

    state
        .reconciler()
        .delete_song(&song)
        .await
        .map_err(map_reconcile_error)?;
    Ok(Json(json!({ "status": "ok", "message": "Song removed" })))
}
