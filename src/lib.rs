//! # diplomacy-relay
//!
//! Notification relay between webDiplomacy games and chat channels.
//!
//! The relay polls the board page of every followed game, turns the
//! difference between successive polls into chat notifications (new
//! round, deadline alarms, game end) and lets chat users manage what is
//! followed through short text commands. The chat network itself is
//! reached through bridge processes connected over HTTP and WebSocket.
//!
//! ## Architecture
//!
//! ```text
//! Chat bridges (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── CommandInterpreter (service/)
//!     ├── PollScheduler → TransitionEngine (service/)
//!     ├── BridgeGateway → EventBus (gateway, domain/)
//!     │
//!     ├── WebDiplomacyClient → RegexPageParser (source/)
//!     │
//!     └── SQLite Persistence
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod persistence;
pub mod service;
pub mod shutdown;
pub mod source;
pub mod ws;
