//! EventSub WebSocket client for chat messages.
//!
//! Connects to wss://eventsub.wss.twitch.tv/ws, subscribes to
//! `channel.chat.message` once per broadcaster channel, and reconnects
//! with exponential backoff.

mod connection;

use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use crate::{ChatMessage, TwitchError};

const EVENTSUB_URL: &str = "wss://eventsub.wss.twitch.tv/ws";
const SUBSCRIPTIONS_URL: &str = "https://api.twitch.tv/helix/eventsub/subscriptions";
const KEEPALIVE_TIMEOUT: Duration = Duration::from_secs(30);
const BASE_BACKOFF: Duration = Duration::from_secs(2);
const MAX_BACKOFF: Duration = Duration::from_secs(60);
const FAILURE_RESET_WINDOW: Duration = Duration::from_secs(5 * 60);
const MAX_CONSECUTIVE_FAILURES_BEFORE_RESTART: u32 = 8;

pub const EVENT_CHAT_MESSAGE: &str = "channel.chat.message";

/// EventSub WebSocket client configuration.
#[derive(Debug, Clone)]
pub struct EventSubConfig {
    pub client_id: String,
    pub access_token: String,
    /// Account whose token reads the chat.
    pub reader_user_id: String,
    /// Broadcaster channels to read chat from.
    pub channels: Vec<String>,
}

/// EventSub WebSocket client with auto-reconnect.
///
/// Chat messages are delivered via `mpsc::Receiver<ChatMessage>`. The
/// receiver closes when the loop gives up (auth failure or too many
/// consecutive connection failures), so the caller can rebuild its config.
pub struct EventSubClient;

impl EventSubClient {
    /// Start the EventSub loop. Returns a message receiver and shutdown sender.
    pub fn connect(config: EventSubConfig) -> (mpsc::Receiver<ChatMessage>, mpsc::Sender<()>) {
        let (event_tx, event_rx) = mpsc::channel::<ChatMessage>(256);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
        tokio::spawn(Self::run_loop(config, event_tx, shutdown_rx));
        (event_rx, shutdown_tx)
    }

    async fn run_loop(
        config: EventSubConfig,
        event_tx: mpsc::Sender<ChatMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        let mut failures: u32 = 0;
        let mut last_failure_at: Option<Instant> = None;
        let mut ws_url = EVENTSUB_URL.to_string();
        loop {
            if shutdown_rx.try_recv().is_ok() {
                tracing::info!("EventSub shutdown requested");
                return;
            }
            if let Some(last_failure) = last_failure_at {
                if last_failure.elapsed() >= FAILURE_RESET_WINDOW {
                    failures = 0;
                    last_failure_at = None;
                }
            }
            // A reconnect URL keeps the existing subscriptions alive.
            let resubscribe = ws_url == EVENTSUB_URL;
            match Self::connect_once(&config, &ws_url, resubscribe, &event_tx, &mut shutdown_rx)
                .await
            {
                Ok(Some(next_url)) => {
                    failures = 0;
                    ws_url = next_url;
                }
                Ok(None) => {
                    tracing::info!("EventSub connection closed cleanly");
                    return;
                }
                Err(e) => {
                    if Self::is_auth_error(&e) {
                        tracing::warn!(error = %e, "EventSub rejected credentials; stopping");
                        return;
                    }
                    failures += 1;
                    last_failure_at = Some(Instant::now());
                    ws_url = EVENTSUB_URL.to_string();
                    if failures >= MAX_CONSECUTIVE_FAILURES_BEFORE_RESTART {
                        tracing::warn!(failures, "EventSub failures exceeded threshold; stopping");
                        return;
                    }
                    let backoff = Self::backoff_duration(failures);
                    tracing::warn!(
                        error = %e, attempt = failures,
                        backoff_secs = backoff.as_secs(),
                        "EventSub connection failed, will reconnect"
                    );
                    tokio::select! {
                        _ = shutdown_rx.recv() => return,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
            }
        }
    }

    pub(super) fn backoff_duration(failures: u32) -> Duration {
        let d = BASE_BACKOFF * 2u32.saturating_pow(failures.saturating_sub(1));
        d.min(MAX_BACKOFF)
    }

    pub(super) fn is_auth_error(error: &TwitchError) -> bool {
        matches!(
            error,
            TwitchError::ApiError {
                status: 401,
                ..
            } | TwitchError::AuthRequired
        )
    }
}
