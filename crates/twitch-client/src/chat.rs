//! Chat message payloads.

use serde::{Deserialize, Serialize};

/// A chat message posted in a broadcaster's channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub message_id: String,
    /// Channel the message was posted in.
    pub broadcaster_user_id: String,
    pub broadcaster_user_login: String,
    pub chatter_user_id: String,
    pub chatter_user_login: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
struct RawChatEvent {
    #[serde(default)]
    message_id: String,
    broadcaster_user_id: String,
    #[serde(default)]
    broadcaster_user_login: String,
    #[serde(default)]
    chatter_user_id: String,
    #[serde(default)]
    chatter_user_login: String,
    message: RawChatBody,
}

#[derive(Debug, Deserialize)]
struct RawChatBody {
    #[serde(default)]
    text: String,
}

impl ChatMessage {
    /// Build from the `event` object of a `channel.chat.message` notification.
    pub fn from_event(event: &serde_json::Value) -> Result<Self, serde_json::Error> {
        let raw = RawChatEvent::deserialize(event)?;
        Ok(Self {
            message_id: raw.message_id,
            broadcaster_user_id: raw.broadcaster_user_id,
            broadcaster_user_login: raw.broadcaster_user_login,
            chatter_user_id: raw.chatter_user_id,
            chatter_user_login: raw.chatter_user_login,
            text: raw.message.text,
        })
    }
}
