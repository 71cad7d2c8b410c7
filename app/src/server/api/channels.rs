//! Watched channel management API.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::json;

use crate::app::SharedState;
use crate::reconcile::RemoteVideoService;

use super::{ApiResult, err_json, map_watch_error};

#[derive(Debug, Deserialize)]
pub struct WatchRequest {
    pub channel_id: String,
    /// Display name, also used as the channel playlist's name.
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UnwatchQuery {
    #[serde(default)]
    pub purge: bool,
}

/// GET /api/channels
pub async fn list_channels<R: RemoteVideoService + 'static>(
    State(state): State<SharedState<R>>,
) -> ApiResult {
    let channels = state.watch().list().map_err(map_watch_error)?;
    let count = channels.len();
    Ok(Json(json!({ "channels": channels, "count": count })))
}

/// POST /api/channels
pub async fn watch_channel<R: RemoteVideoService + 'static>(
    State(state): State<SharedState<R>>,
    Json(body): Json<WatchRequest>,
) -> ApiResult {
    let channel_id = body.channel_id.trim();
    if channel_id.is_empty() {
        return Err(err_json(400, "channel_id is required"));
    }
    let name = body
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(channel_id);

    let channel = state.watch().watch(channel_id, name).map_err(map_watch_error)?;
    Ok(Json(json!({ "status": "ok", "channel": channel })))
}

/// DELETE /api/channels/{channel_id}?purge=true
pub async fn unwatch_channel<R: RemoteVideoService + 'static>(
    State(state): State<SharedState<R>>,
    Path(channel_id): Path<String>,
    Query(q): Query<UnwatchQuery>,
) -> ApiResult {
    state
        .watch()
        .unwatch(&channel_id, q.purge)
        .map_err(map_watch_error)?;
    let message = if q.purge {
        "Channel removed"
    } else {
        "Channel no longer watched"
    };
    Ok(Json(json!({ "status": "ok", "message": message })))
}
