use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::api;
use crate::app::SharedState;
use crate::reconcile::RemoteVideoService;

/// Create the axum router with all routes.
pub fn create_router<R: RemoteVideoService + 'static>(state: SharedState<R>) -> Router {
    Router::new()
        // --- Core ---
        .route("/status", get(status_handler))
        // --- Watched channels ---
        .route(
            "/api/channels",
            get(api::channels::list_channels::<R>).post(api::channels::watch_channel::<R>),
        )
        .route(
            "/api/channels/{channel_id}",
            axum::routing::delete(api::channels::unwatch_channel::<R>),
        )
        // --- Playlists ---
        .route(
            "/api/playlists",
            get(api::playlists::list_playlists::<R>).post(api::playlists::create_playlist::<R>),
        )
        .route("/api/playlist-search", get(api::playlists::search_playlists::<R>))
        .route("/api/playlist-sync", post(api::playlists::sync_playlists::<R>))
        .route(
            "/api/playlists/{name}",
            get(api::playlists::get_playlist::<R>).delete(api::playlists::delete_playlist::<R>),
        )
        .route(
            "/api/playlists/{name}/songs",
            post(api::playlists::add_song::<R>).delete(api::playlists::remove_song::<R>),
        )
        // --- OAuth ---
        .route("/api/auth/status", get(api::auth::auth_status::<R>))
        .route("/auth/youtube", get(api::auth::youtube_auth::<R>))
        .route("/callback/youtube", get(api::auth::youtube_callback::<R>))
        .route("/auth/twitch", get(api::auth::twitch_auth::<R>))
        .route("/callback/twitch", get(api::auth::twitch_callback::<R>))
        // --- Middleware ---
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn status_handler() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
