//! REST API handlers grouped by domain.

pub mod auth;
pub mod channels;
pub mod playlists;

use axum::Json;
use axum::http::StatusCode;
use mirror_db::DbError;
use serde_json::{Value, json};

use crate::reconcile::ReconcileError;
use crate::watch::WatchError;

pub type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

/// Standard error response.
pub fn err_json(status: u16, message: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(json!({ "status": "error", "error": message })),
    )
}

pub(crate) fn map_db_error(e: DbError) -> (StatusCode, Json<Value>) {
    let status = match e {
        DbError::NotFound(_) => 404,
        DbError::Conflict(_) => 409,
        _ => 500,
    };
    err_json(status, &e.to_string())
}

pub(crate) fn map_watch_error(e: WatchError) -> (StatusCode, Json<Value>) {
    match e {
        WatchError::AlreadyWatched(_) => err_json(409, &e.to_string()),
        WatchError::NotWatched(_) => err_json(404, &e.to_string()),
        WatchError::Db(e) => map_db_error(e),
        WatchError::AlreadyInitialized => err_json(500, &e.to_string()),
    }
}

pub(crate) fn map_reconcile_error(e: ReconcileError) -> (StatusCode, Json<Value>) {
    let status = match &e {
        ReconcileError::Db(_) => 500,
        ReconcileError::DuplicatePlaylist(_) | ReconcileError::DuplicateSong { .. } => 409,
        ReconcileError::UnsyncedPlaylist(_) => 400,
        ReconcileError::Gone(_) => 404,
        ReconcileError::Remote(_) | ReconcileError::MissingRemoteId(_) => 502,
    };
    if status >= 500 {
        tracing::warn!(status, "Request failed: {e}");
    }
    err_json(status, &e.to_string())
}
