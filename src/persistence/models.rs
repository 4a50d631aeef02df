//! Database models for pollers and alarms.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{ChannelId, GameId};

/// A row of the `pollers` table: one game followed in one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Poller {
    /// Followed game.
    pub game_id: GameId,
    /// Channel receiving the notifications.
    pub channel_id: ChannelId,
    /// Seconds until the deadline at the last poll; `None` before the first.
    pub last_delta: Option<i64>,
}

/// A row of the `alarms` table: alert `hours` before every deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Alarm {
    /// Hours before the deadline.
    pub hours: u32,
    /// Channel the alarm belongs to.
    pub channel_id: ChannelId,
}

impl Alarm {
    /// Threshold in seconds before the deadline.
    #[must_use]
    pub fn threshold_seconds(&self) -> i64 {
        i64::from(self.hours) * 3600
    }
}
