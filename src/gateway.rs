//! Outbound chat capability.
//!
//! The core never owns a chat-network connection. It is handed a
//! [`ChatGateway`] and calls it to deliver messages. [`BridgeGateway`]
//! implements it by publishing to the [`EventBus`]; bridge processes
//! connected over WebSocket forward the events to the chat network.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::{ChannelId, EventBus, OutboundMessage, RelayEvent};
use crate::error::RelayError;

/// Capability to deliver messages to chat channels.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Returns `true` if messages for `channel` can currently be delivered.
    async fn resolve_channel(&self, channel: ChannelId) -> bool;

    /// Delivers `message` to `channel`.
    async fn send(&self, channel: ChannelId, message: OutboundMessage) -> Result<(), RelayError>;
}

/// Channel routing table shared by all bridge connections.
///
/// Each connection registers the channels it serves; a connection that
/// serves every channel registers the wildcard.
#[derive(Debug, Default)]
pub struct ChannelDirectory {
    channels: RwLock<HashMap<ChannelId, usize>>,
    wildcards: RwLock<usize>,
}

impl ChannelDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one more connection serving `channel`.
    pub async fn attach(&self, channel: ChannelId) {
        let mut map = self.channels.write().await;
        let count = map.entry(channel).or_insert(0);
        *count = count.saturating_add(1);
    }

    /// Unregisters one connection serving `channel`.
    pub async fn detach(&self, channel: ChannelId) {
        let mut map = self.channels.write().await;
        if let Some(count) = map.get_mut(&channel) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                map.remove(&channel);
            }
        }
    }

    /// Registers a connection serving every channel.
    pub async fn attach_all(&self) {
        let mut count = self.wildcards.write().await;
        *count = count.saturating_add(1);
    }

    /// Unregisters a connection serving every channel.
    pub async fn detach_all(&self) {
        let mut count = self.wildcards.write().await;
        *count = count.saturating_sub(1);
    }

    /// Returns `true` if at least one connection serves `channel`.
    pub async fn is_served(&self, channel: ChannelId) -> bool {
        if *self.wildcards.read().await > 0 {
            return true;
        }
        self.channels.read().await.contains_key(&channel)
    }
}

/// [`ChatGateway`] that hands messages to connected bridges.
#[derive(Debug, Clone)]
pub struct BridgeGateway {
    event_bus: EventBus,
    directory: Arc<ChannelDirectory>,
}

impl BridgeGateway {
    /// Creates a gateway publishing on `event_bus`.
    #[must_use]
    pub fn new(event_bus: EventBus, directory: Arc<ChannelDirectory>) -> Self {
        Self {
            event_bus,
            directory,
        }
    }

    /// Routing table used to resolve channels.
    #[must_use]
    pub fn directory(&self) -> &Arc<ChannelDirectory> {
        &self.directory
    }
}

#[async_trait]
impl ChatGateway for BridgeGateway {
    async fn resolve_channel(&self, channel: ChannelId) -> bool {
        self.directory.is_served(channel).await
    }

    async fn send(&self, channel: ChannelId, message: OutboundMessage) -> Result<(), RelayError> {
        if !self.resolve_channel(channel).await {
            return Err(RelayError::ChannelUnavailable(channel));
        }
        let receivers = self.event_bus.publish(RelayEvent::MessageOutbound {
            channel_id: channel,
            message,
            timestamp: Utc::now(),
        });
        if receivers == 0 {
            return Err(RelayError::ChannelUnavailable(channel));
        }
        tracing::debug!(%channel, receivers, "message handed to bridge");
        Ok(())
    }
}
