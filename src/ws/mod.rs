//! WebSocket layer: bridge connections, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` is where chat-network bridges connect.
//! A bridge subscribes to the channels it serves, receives outbound
//! messages for them as events and forwards inbound chat text as
//! `message` commands.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
