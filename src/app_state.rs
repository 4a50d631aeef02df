//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::EventBus;
use crate::gateway::ChannelDirectory;
use crate::persistence::SubscriptionStore;
use crate::service::CommandInterpreter;
use crate::shutdown::Shutdown;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Chat command interpreter.
    pub interpreter: Arc<CommandInterpreter>,
    /// Subscription store, for read-only listings.
    pub store: Arc<dyn SubscriptionStore>,
    /// Outbound message bus consumed by WebSocket bridges.
    pub event_bus: EventBus,
    /// Channels currently served by a bridge connection.
    pub directory: Arc<ChannelDirectory>,
    /// Bearer secret bridges must present.
    pub bot_token: Arc<str>,
    /// Process-wide stop signal.
    pub shutdown: Shutdown,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("interpreter", &self.interpreter)
            .field("event_bus", &self.event_bus)
            .field("directory", &self.directory)
            .field("bot_token", &"<redacted>")
            .finish_non_exhaustive()
    }
}
