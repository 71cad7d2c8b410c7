use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;

use super::*;

#[derive(Debug, Deserialize)]
struct WsMessage {
    metadata: WsMetadata,
    payload: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct WsMetadata {
    message_type: String,
}

#[derive(Debug, Deserialize)]
struct WelcomePayload {
    session: SessionInfo,
}

#[derive(Debug, Deserialize)]
struct SessionInfo {
    id: String,
}

#[derive(Debug, Serialize)]
pub(super) struct SubscribeRequest {
    #[serde(rename = "type")]
    pub(super) event_type: &'static str,
    pub(super) version: &'static str,
    pub(super) condition: serde_json::Value,
    pub(super) transport: SubscribeTransport,
}

#[derive(Debug, Serialize)]
pub(super) struct SubscribeTransport {
    pub(super) method: &'static str,
    pub(super) session_id: String,
}

pub(super) enum MessageAction {
    Continue,
    Chat(ChatMessage),
    Reconnect(String),
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

impl EventSubClient {
    pub(super) async fn connect_once(
        config: &EventSubConfig,
        ws_url: &str,
        resubscribe: bool,
        event_tx: &mpsc::Sender<ChatMessage>,
        shutdown_rx: &mut mpsc::Receiver<()>,
    ) -> Result<Option<String>, TwitchError> {
        use tokio_tungstenite::tungstenite::Message as Msg;

        tracing::info!(ws_url = %ws_url, "Connecting to EventSub WebSocket");
        let (mut ws, _) = connect_async(ws_url).await?;
        let session_id = Self::wait_for_welcome(&mut ws).await?;
        if resubscribe {
            Self::subscribe_channels(config, &session_id).await?;
        }

        let timeout = KEEPALIVE_TIMEOUT * 2;
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    let _ = ws.close(None).await;
                    return Ok(None);
                }
                result = tokio::time::timeout(timeout, ws.next()) => {
                    match result {
                        Ok(Some(Ok(Msg::Text(text)))) => {
                            match Self::handle_message(&text)? {
                                MessageAction::Continue => {}
                                MessageAction::Chat(msg) => {
                                    if event_tx.send(msg).await.is_err() {
                                        let _ = ws.close(None).await;
                                        return Ok(None);
                                    }
                                }
                                MessageAction::Reconnect(next_url) => {
                                    tracing::info!(next_url = %next_url, "EventSub session_reconnect received");
                                    let _ = ws.close(None).await;
                                    return Ok(Some(next_url));
                                }
                            }
                        }
                        Ok(Some(Ok(Msg::Ping(data)))) => {
                            let _ = ws.send(Msg::Pong(data)).await;
                        }
                        Ok(Some(Ok(Msg::Close(_)))) | Ok(None) => {
                            return Err(TwitchError::EventSub("Server closed".into()));
                        }
                        Ok(Some(Err(e))) => return Err(TwitchError::WebSocket(e)),
                        Ok(Some(Ok(_))) => {}
                        Err(_) => {
                            tracing::warn!("EventSub keepalive timeout");
                            return Err(TwitchError::Timeout);
                        }
                    }
                }
            }
        }
    }

    async fn wait_for_welcome(ws: &mut WsStream) -> Result<String, TwitchError> {
        use tokio_tungstenite::tungstenite::Message as Msg;
        loop {
            match tokio::time::timeout(KEEPALIVE_TIMEOUT, ws.next()).await {
                Ok(Some(Ok(Msg::Text(text)))) => {
                    let ws_msg: WsMessage = serde_json::from_str(&text)?;
                    if ws_msg.metadata.message_type == "session_welcome" {
                        let p: WelcomePayload = serde_json::from_value(ws_msg.payload)?;
                        tracing::info!(session_id = %p.session.id, "EventSub welcome");
                        return Ok(p.session.id);
                    }
                }
                Ok(Some(Ok(_))) => continue,
                Ok(Some(Err(e))) => return Err(TwitchError::WebSocket(e)),
                Ok(None) => return Err(TwitchError::EventSub("Connection closed".into())),
                Err(_) => return Err(TwitchError::Timeout),
            }
        }
    }

    pub(super) fn handle_message(text: &str) -> Result<MessageAction, TwitchError> {
        let ws_msg: WsMessage = serde_json::from_str(text)?;
        match ws_msg.metadata.message_type.as_str() {
            "session_keepalive" => Ok(MessageAction::Continue),
            "notification" => {
                let sub_type = ws_msg
                    .payload
                    .get("subscription")
                    .and_then(|s| s.get("type"))
                    .and_then(|t| t.as_str());
                if sub_type != Some(EVENT_CHAT_MESSAGE) {
                    tracing::debug!(?sub_type, "Ignoring EventSub notification");
                    return Ok(MessageAction::Continue);
                }
                let Some(event) = ws_msg.payload.get("event") else {
                    return Ok(MessageAction::Continue);
                };
                match ChatMessage::from_event(event) {
                    Ok(msg) => Ok(MessageAction::Chat(msg)),
                    Err(e) => {
                        tracing::warn!(error = %e, "Malformed chat notification");
                        Ok(MessageAction::Continue)
                    }
                }
            }
            "session_reconnect" => Self::parse_reconnect_url(&ws_msg.payload)
                .map(MessageAction::Reconnect)
                .ok_or_else(|| {
                    TwitchError::EventSub("session_reconnect missing reconnect_url".into())
                }),
            "revocation" => {
                let condition = ws_msg
                    .payload
                    .get("subscription")
                    .and_then(|s| s.get("condition"))
                    .cloned()
                    .unwrap_or(serde_json::Value::Null);
                tracing::warn!(%condition, "EventSub chat subscription revoked");
                Ok(MessageAction::Continue)
            }
            other => {
                tracing::debug!(msg_type = other, "Unhandled EventSub message");
                Ok(MessageAction::Continue)
            }
        }
    }

    pub(super) fn parse_reconnect_url(payload: &serde_json::Value) -> Option<String> {
        payload
            .get("session")
            .and_then(|session| session.get("reconnect_url"))
            .and_then(|url| url.as_str())
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(ToOwned::to_owned)
    }

    /// Subscribe to chat for each channel. A channel the reader may not
    /// read is skipped; rejected credentials abort the connection.
    async fn subscribe_channels(
        config: &EventSubConfig,
        session_id: &str,
    ) -> Result<(), TwitchError> {
        let http = reqwest::Client::new();
        for channel in &config.channels {
            let req = Self::chat_subscription(channel, &config.reader_user_id, session_id);
            let resp = http
                .post(SUBSCRIPTIONS_URL)
                .header("Authorization", format!("Bearer {}", config.access_token))
                .header("Client-Id", &config.client_id)
                .json(&req)
                .send()
                .await?;
            let status = resp.status().as_u16();
            if resp.status().is_success() {
                tracing::info!(channel = %channel, "Subscribed to chat");
                continue;
            }
            let body = resp.text().await.unwrap_or_default();
            if status == 401 {
                return Err(TwitchError::ApiError {
                    status,
                    message: body,
                });
            }
            tracing::error!(channel = %channel, status, body, "Failed to subscribe to chat");
        }
        Ok(())
    }

    pub(super) fn chat_subscription(
        broadcaster_id: &str,
        reader_id: &str,
        session_id: &str,
    ) -> SubscribeRequest {
        SubscribeRequest {
            event_type: EVENT_CHAT_MESSAGE,
            version: "1",
            condition: serde_json::json!({
                "broadcaster_user_id": broadcaster_id,
                "user_id": reader_id,
            }),
            transport: SubscribeTransport {
                method: "websocket",
                session_id: session_id.into(),
            },
        }
    }
}
