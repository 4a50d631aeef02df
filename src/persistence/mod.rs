//! Persistence layer: durable pollers and alarms.
//!
//! [`SubscriptionStore`] is the only way to read or mutate the two tables.
//! Adds report `false` when the composite key already exists and removes
//! report `false` when it is absent, so callers can word "already
//! following" style replies without treating conflicts as errors. The
//! concrete implementation uses `sqlx::SqlitePool`.

pub mod models;
pub mod sqlite;

use async_trait::async_trait;

pub use models::{Alarm, Poller};
pub use sqlite::SqliteStore;

use crate::domain::{ChannelId, GameId};
use crate::error::RelayError;

/// Repository over the `pollers` and `alarms` tables.
///
/// Scans return rows in insertion order.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Returns `true` if `game` is followed in `channel`.
    async fn contains_poller(&self, game: GameId, channel: ChannelId) -> Result<bool, RelayError>;

    /// Starts following `game` in `channel`. Returns `false` if it already was.
    async fn add_poller(&self, game: GameId, channel: ChannelId) -> Result<bool, RelayError>;

    /// Stops following `game` in `channel`. Returns `false` if it was not.
    async fn remove_poller(&self, game: GameId, channel: ChannelId) -> Result<bool, RelayError>;

    /// Records the seconds-until-deadline seen at the latest poll.
    async fn update_poller_delta(
        &self,
        game: GameId,
        channel: ChannelId,
        seconds: i64,
    ) -> Result<(), RelayError>;

    /// All pollers.
    async fn pollers(&self) -> Result<Vec<Poller>, RelayError>;

    /// Pollers of one channel.
    async fn pollers_for_channel(&self, channel: ChannelId) -> Result<Vec<Poller>, RelayError>;

    /// Returns `true` if `channel` is alerted `hours` before deadlines.
    async fn contains_alarm(&self, hours: u32, channel: ChannelId) -> Result<bool, RelayError>;

    /// Adds an alarm. Returns `false` if it already existed.
    async fn add_alarm(&self, hours: u32, channel: ChannelId) -> Result<bool, RelayError>;

    /// Removes an alarm. Returns `false` if it did not exist.
    async fn remove_alarm(&self, hours: u32, channel: ChannelId) -> Result<bool, RelayError>;

    /// All alarms.
    async fn alarms(&self) -> Result<Vec<Alarm>, RelayError>;

    /// Alarms of one channel.
    async fn alarms_for_channel(&self, channel: ChannelId) -> Result<Vec<Alarm>, RelayError>;
}
