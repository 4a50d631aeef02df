//! WebSocket message types: envelope, commands, and events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ChannelId;

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    #[serde(default)]
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// Builds a server-side envelope stamped with the current time.
    #[must_use]
    pub fn new(id: impl Into<String>, msg_type: WsMessageType, payload: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            msg_type,
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client outbound chat event.
    Event,
    /// Server → Client error.
    Error,
}

/// One entry of a `channel_ids` list: a channel id (number or numeric
/// string) or the wildcard `"*"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ChannelSelector {
    /// A single channel.
    Id(ChannelId),
    /// Either `"*"` or a channel id in string form.
    Text(String),
}

/// Channel selection parsed out of a `channel_ids` list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelSelection {
    /// Explicit channels.
    pub ids: Vec<ChannelId>,
    /// Whether `"*"` was present.
    pub wildcard: bool,
    /// Entries that were neither a channel id nor `"*"`.
    pub rejected: Vec<String>,
}

impl ChannelSelection {
    /// Splits selectors into explicit ids and the wildcard flag.
    #[must_use]
    pub fn from_selectors(selectors: &[ChannelSelector]) -> Self {
        let mut selection = Self::default();
        for selector in selectors {
            match selector {
                ChannelSelector::Id(id) => selection.ids.push(*id),
                ChannelSelector::Text(text) if text == "*" => selection.wildcard = true,
                ChannelSelector::Text(text) => match text.parse::<i64>() {
                    Ok(raw) => selection.ids.push(ChannelId::new(raw)),
                    Err(_) => selection.rejected.push(text.clone()),
                },
            }
        }
        selection
    }
}

/// Commands that a bridge can send over WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Start receiving outbound messages for channels.
    Subscribe {
        /// Channels to serve. Use `["*"]` for all channels.
        channel_ids: Vec<ChannelSelector>,
    },
    /// Stop receiving outbound messages for channels.
    Unsubscribe {
        /// Channels to stop serving. `"*"` turns the wildcard off.
        channel_ids: Vec<ChannelSelector>,
    },
    /// Inbound chat message for the command interpreter.
    Message {
        /// Display name of the author.
        author: String,
        /// Channel the message was written in.
        channel_id: ChannelId,
        /// Raw message text.
        content: String,
    },
}
