//! Headless server binary.
//!
//! Starts the admin API, the token refresh loop and the chat bridge, then
//! waits for Ctrl+C.

use tracing_subscriber::EnvFilter;

use playlist_mirror::app::SharedState;
use playlist_mirror::{background, chat_bridge, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting playlist-mirror");

    let (db, config, membership) = playlist_mirror::init_foundation()?;
    let state: SharedState = SharedState::new(db, config, membership);

    let server_state = state.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server::start_server(server_state).await {
            tracing::error!("Server failed: {e}");
        }
    });

    let s = state.clone();
    tokio::spawn(async move { background::token_refresh_loop(s).await });

    let s = state.clone();
    tokio::spawn(async move { chat_bridge::run(s).await });

    tracing::info!(
        port = state.server_port(),
        "Server running. Press Ctrl+C to stop."
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    state.shutdown_token().cancel();
    if let Err(e) = server_handle.await {
        tracing::warn!("Server task ended abnormally: {e}");
    }
    Ok(())
}
