//! DTOs for inbound chat messages forwarded by a bridge.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{ChannelId, OutboundMessage};

/// Request body for `POST /api/v1/messages`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct InboundMessageRequest {
    /// Display name of the chat user who wrote the message.
    pub author: String,
    /// Channel the message was written in.
    pub channel_id: ChannelId,
    /// Raw message text.
    pub content: String,
}

/// Response body for `POST /api/v1/messages`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InboundMessageResponse {
    /// Reply to post in the same channel, if the relay has one.
    pub reply: Option<OutboundMessage>,
}
