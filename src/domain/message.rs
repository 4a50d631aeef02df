//! Outbound chat payloads.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::GameSnapshot;

/// Rich card describing a game, rendered by the chat bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GameEmbed {
    /// `"{title} - {date} - {phase} phase"`.
    pub title: String,
    /// Notification or reply text.
    pub description: String,
    /// Link to the game board.
    pub url: String,
    /// Map image shown under the text.
    pub image_url: String,
}

impl GameEmbed {
    /// Builds an embed for `game` carrying `description`.
    #[must_use]
    pub fn for_game(game: &GameSnapshot, description: impl Into<String>) -> Self {
        Self {
            title: game.headline(),
            description: description.into(),
            url: game.url.clone(),
            image_url: game.map_url.clone(),
        }
    }
}

/// A message the relay wants delivered to a chat channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Plain text.
    Text(String),
    /// Game card.
    Embed(GameEmbed),
}

impl OutboundMessage {
    /// Main text of the message, whatever its shape.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Embed(embed) => &embed.description,
        }
    }
}

impl From<String> for OutboundMessage {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for OutboundMessage {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}
