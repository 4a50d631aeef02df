//! Type-safe game and channel identifiers.
//!
//! [`GameId`] wraps a webDiplomacy game number and refuses non-positive
//! values. [`ChannelId`] wraps the chat network's channel identifier so the
//! two can never be swapped in a store call.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::RelayError;

/// Identifier of a game on the remote game service.
///
/// Always strictly positive. Construct it through [`GameId::new`] or by
/// parsing a string; both reject zero and negative numbers with
/// [`RelayError::InvalidGame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ToSchema)]
#[serde(transparent)]
pub struct GameId(i64);

impl GameId {
    /// Creates a `GameId`, validating that it is strictly positive.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidGame`] if `id <= 0`.
    pub fn new(id: i64) -> Result<Self, RelayError> {
        if id <= 0 {
            return Err(RelayError::InvalidGame(format!(
                "game id must be positive, got {id}"
            )));
        }
        Ok(Self(id))
    }

    /// Returns the raw numeric identifier.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GameId {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s
            .parse::<i64>()
            .map_err(|e| RelayError::InvalidGame(format!("{s:?} is not a game id: {e}")))?;
        Self::new(id)
    }
}

impl<'de> Deserialize<'de> for GameId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = i64::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Identifier of a chat channel on the chat network.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct ChannelId(i64);

impl ChannelId {
    /// Wraps a raw channel identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw channel identifier.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ChannelId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}
