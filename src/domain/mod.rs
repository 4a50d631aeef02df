//! Domain layer: identifiers, game snapshots, chat payloads and events.
//!
//! This module holds the types shared by every other layer: typed game and
//! channel identifiers, the parsed [`GameSnapshot`], the
//! [`OutboundMessage`] sent to chat channels, and the [`EventBus`] that
//! carries outbound messages to connected bridges.

pub mod event_bus;
pub mod game;
pub mod ids;
pub mod message;
pub mod relay_event;

pub use event_bus::EventBus;
pub use game::{GameSnapshot, TimeLeft};
pub use ids::{ChannelId, GameId};
pub use message::{GameEmbed, OutboundMessage};
pub use relay_event::RelayEvent;
