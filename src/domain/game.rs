//! Point-in-time view of a remote game.
//!
//! A [`GameSnapshot`] is built fresh from every page fetch. Deadline-relative
//! values are not stored; they are derived against a caller-supplied `now`
//! through [`GameSnapshot::time_left`], so the same snapshot can be read
//! deterministically in tests.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::GameId;

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;

/// Time remaining until a deadline, split the way the notifications use it.
///
/// Days use floor division, so a deadline that already passed yields a
/// negative `days` with `hours`/`minutes` still in their normal ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeLeft {
    /// Whole days remaining.
    pub days: i64,
    /// Whole hours remaining after whole days (0..24).
    pub hours: i64,
    /// Whole minutes remaining after whole hours (0..60).
    pub minutes: i64,
    /// Total seconds remaining. This is the poller delta.
    pub total_seconds: i64,
}

impl TimeLeft {
    /// Splits a total number of seconds into days, hours and minutes.
    #[must_use]
    pub const fn from_seconds(total_seconds: i64) -> Self {
        let remainder = total_seconds.rem_euclid(SECONDS_PER_DAY);
        Self {
            days: total_seconds.div_euclid(SECONDS_PER_DAY),
            hours: remainder / SECONDS_PER_HOUR,
            minutes: (remainder / SECONDS_PER_MINUTE) % 60,
            total_seconds,
        }
    }
}

/// Parsed state of one game as observed on a single fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSnapshot {
    /// Game identifier on the remote service.
    pub game_id: GameId,
    /// Game display name.
    pub title: String,
    /// In-game date label (e.g. `"Spring, 1901"`).
    pub date: String,
    /// Current phase label (e.g. `"Diplomacy"`).
    pub phase: String,
    /// Absolute deadline of the current phase, if one is running.
    pub deadline: Option<DateTime<Utc>>,
    /// Countries that have been defeated.
    pub defeated: Vec<String>,
    /// Countries that still have to submit orders.
    pub not_ready: Vec<String>,
    /// Countries that have submitted orders.
    pub ready: Vec<String>,
    /// Winning country, if the game was won.
    pub won: Option<String>,
    /// Countries sharing a draw; empty unless the game was drawn.
    pub drawn: Vec<String>,
    /// Whether the game has not formally started yet.
    pub pregame: bool,
    /// Canonical page URL of the game board.
    pub url: String,
    /// Map image URL, unique per fetch.
    pub map_url: String,
}

impl GameSnapshot {
    /// Time remaining until the deadline as seen at `now`.
    ///
    /// Returns `None` when the game has no active deadline.
    #[must_use]
    pub fn time_left(&self, now: DateTime<Utc>) -> Option<TimeLeft> {
        self.deadline
            .map(|deadline| TimeLeft::from_seconds((deadline - now).num_seconds()))
    }

    /// Title line used for embeds: `"{title} - {date} - {phase} phase"`.
    #[must_use]
    pub fn headline(&self) -> String {
        format!("{} - {} - {} phase", self.title, self.date, self.phase)
    }
}
