//! Events published on the [`super::EventBus`].
//!
//! The poll scheduler and the command interpreter never talk to the chat
//! network directly; they publish [`RelayEvent`]s that connected bridges
//! receive through their WebSocket subscription.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ChannelId, OutboundMessage};

/// Event broadcast to every connected chat bridge.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum RelayEvent {
    /// A message must be delivered to a chat channel.
    MessageOutbound {
        /// Target channel.
        channel_id: ChannelId,
        /// Payload to deliver.
        message: OutboundMessage,
        /// Publication timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl RelayEvent {
    /// Returns the channel this event is addressed to.
    #[must_use]
    pub fn channel_id(&self) -> ChannelId {
        match self {
            Self::MessageOutbound { channel_id, .. } => *channel_id,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::MessageOutbound { .. } => "message_outbound",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_event_type() {
        let event = RelayEvent::MessageOutbound {
            channel_id: ChannelId::new(9),
            message: OutboundMessage::from("lol xD"),
            timestamp: Utc::now(),
        };
        assert_eq!(event.event_type_str(), "message_outbound");
        assert_eq!(event.channel_id(), ChannelId::new(9));
        let json = serde_json::to_string(&event).unwrap_or_default();
        assert!(json.contains("message_outbound"));
        assert!(json.contains("lol xD"));
    }
}
