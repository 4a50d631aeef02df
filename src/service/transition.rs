//! Snapshot-to-notification state machine.
//!
//! [`TransitionEngine::evaluate`] compares a fresh [`GameSnapshot`] with the
//! delta stored for its (game, channel) poller and decides what to announce.
//! The primary transition is picked by precedence (pregame, won, drawn, new
//! round); alarm crossings are checked independently and added on top.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::domain::{ChannelId, GameSnapshot};
use crate::error::RelayError;
use crate::persistence::SubscriptionStore;

/// A notable change of a followed game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Pregame countdown on a whole-day boundary.
    StartsIn {
        /// Whole days until the game starts.
        days: i64,
    },
    /// The game ended with a winner.
    Won {
        /// Winning country.
        winner: String,
    },
    /// The game ended in a draw.
    Drawn {
        /// Countries sharing the draw.
        countries: Vec<String>,
    },
    /// The deadline jumped forward: a new round began.
    NewRound,
    /// The deadline crossed an alarm threshold.
    Alarm {
        /// Alarm threshold in hours.
        hours: u32,
        /// Countries that have not submitted orders.
        not_ready: Vec<String>,
    },
}

impl Transition {
    /// Returns `true` for outcomes that end the game.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Won { .. } | Self::Drawn { .. })
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartsIn { days } => write!(f, "The game starts in {days} days!"),
            Self::Won { winner } => write!(f, "{winner} has won!"),
            Self::Drawn { countries } => {
                write!(f, "The game was a draw between {}!", countries.join(", "))
            }
            Self::NewRound => f.write_str("Starting new round! Good luck :)"),
            Self::Alarm { hours, not_ready } if not_ready.is_empty() => {
                write!(f, "{hours}h left, everybody's ready!")
            }
            Self::Alarm { hours, not_ready } => write!(
                f,
                "{hours}h left! These countries aren't ready: {}",
                not_ready.join(", ")
            ),
        }
    }
}

/// Decides which transitions a snapshot represents and keeps the poller
/// delta up to date.
#[derive(Clone)]
pub struct TransitionEngine {
    store: Arc<dyn SubscriptionStore>,
    map_regeneration_delay: Duration,
}

impl fmt::Debug for TransitionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionEngine")
            .field("map_regeneration_delay", &self.map_regeneration_delay)
            .finish_non_exhaustive()
    }
}

impl TransitionEngine {
    /// Creates an engine. A new round is announced only after
    /// `map_regeneration_delay`, so the remote map shows the new turn.
    #[must_use]
    pub fn new(store: Arc<dyn SubscriptionStore>, map_regeneration_delay: Duration) -> Self {
        Self {
            store,
            map_regeneration_delay,
        }
    }

    /// Evaluates `game` for the poller in `channel`.
    ///
    /// `prior_delta` is the seconds-until-deadline stored at the previous
    /// poll. A pregame day boundary is announced once, even when two polls
    /// land inside its minute. Won and drawn games unfollow the poller and return only the
    /// terminal transition. Otherwise the new delta is persisted whenever
    /// the game has a deadline.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Persistence`] if the store fails. Missing
    /// snapshot fields are never an error.
    pub async fn evaluate(
        &self,
        game: &GameSnapshot,
        channel: ChannelId,
        prior_delta: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Transition>, RelayError> {
        let left = game.time_left(now);
        let delta = left.map(|l| l.total_seconds);
        let mut transitions = Vec::new();

        if game.pregame {
            if let Some(left) = left
                && left.total_seconds >= 0
                && left.hours == 0
                && left.minutes == 0
                && prior_delta.is_none_or(|prior| {
                    prior.div_euclid(60) != left.total_seconds.div_euclid(60)
                })
            {
                transitions.push(Transition::StartsIn { days: left.days });
            }
        } else if let Some(winner) = &game.won {
            return self
                .finish(game, channel, Transition::Won {
                    winner: winner.clone(),
                })
                .await;
        } else if !game.drawn.is_empty() {
            return self
                .finish(game, channel, Transition::Drawn {
                    countries: game.drawn.clone(),
                })
                .await;
        } else if let (Some(prior), Some(current)) = (prior_delta, delta)
            && current > prior
        {
            tokio::time::sleep(self.map_regeneration_delay).await;
            transitions.push(Transition::NewRound);
        }

        if let (Some(prior), Some(current)) = (prior_delta, delta) {
            for alarm in self.store.alarms_for_channel(channel).await? {
                let threshold = alarm.threshold_seconds();
                if prior > threshold && current <= threshold {
                    transitions.push(Transition::Alarm {
                        hours: alarm.hours,
                        not_ready: game.not_ready.clone(),
                    });
                }
            }
        }

        if let Some(current) = delta {
            self.store
                .update_poller_delta(game.game_id, channel, current)
                .await?;
        }

        Ok(transitions)
    }

    async fn finish(
        &self,
        game: &GameSnapshot,
        channel: ChannelId,
        outcome: Transition,
    ) -> Result<Vec<Transition>, RelayError> {
        let removed = self.store.remove_poller(game.game_id, channel).await?;
        tracing::info!(game_id = %game.game_id, %channel, removed, %outcome, "game over, unfollowing");
        Ok(vec![outcome])
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::game::tests::snapshot;
    use crate::persistence::SqliteStore;
    use chrono::Duration as ChronoDuration;

    const MINUTE: i64 = 60;
    const HOUR: i64 = 60 * MINUTE;
    const DAY: i64 = 24 * HOUR;

    async fn engine() -> (TransitionEngine, Arc<SqliteStore>) {
        engine_with_delay(Duration::ZERO).await
    }

    async fn engine_with_delay(delay: Duration) -> (TransitionEngine, Arc<SqliteStore>) {
        let Ok(store) = SqliteStore::in_memory().await else {
            panic!("in-memory store opens");
        };
        let store = Arc::new(store);
        let engine = TransitionEngine::new(
            Arc::clone(&store) as Arc<dyn SubscriptionStore>,
            delay,
        );
        (engine, store)
    }

    fn running(now: DateTime<Utc>, seconds_left: i64) -> GameSnapshot {
        snapshot(Some(now + ChronoDuration::seconds(seconds_left)))
    }

    async fn messages(
        engine: &TransitionEngine,
        game: &GameSnapshot,
        channel: i64,
        prior: Option<i64>,
        now: DateTime<Utc>,
    ) -> Vec<String> {
        let Ok(transitions) = engine
            .evaluate(game, ChannelId::new(channel), prior, now)
            .await
        else {
            panic!("evaluation succeeds");
        };
        transitions.iter().map(ToString::to_string).collect()
    }

    #[tokio::test]
    async fn pregame_announces_whole_days() {
        let (engine, _) = engine().await;
        let now = Utc::now();
        for n in 0..7 {
            let mut game = running(now, n * DAY);
            game.pregame = true;
            let got = messages(&engine, &game, 1, None, now).await;
            assert_eq!(got, vec![format!("The game starts in {n} days!")]);

            let mut off_boundary = running(now, n * DAY + MINUTE);
            off_boundary.pregame = true;
            assert!(messages(&engine, &off_boundary, 1, None, now).await.is_empty());
        }
    }

    #[tokio::test]
    async fn pregame_boundary_is_announced_once() {
        let (engine, _) = engine().await;
        let now = Utc::now();
        let mut game = running(now, 2 * DAY + 50);
        game.pregame = true;

        let first = messages(&engine, &game, 1, None, now).await;
        assert_eq!(first, vec!["The game starts in 2 days!".to_string()]);

        let later = now + ChronoDuration::seconds(30);
        let second = messages(&engine, &game, 1, Some(2 * DAY + 50), later).await;
        assert!(second.is_empty());

        // The next boundary is announced again.
        let next_day = now + ChronoDuration::seconds(DAY);
        let third = messages(&engine, &game, 1, Some(DAY + 80), next_day).await;
        assert_eq!(third, vec!["The game starts in 1 days!".to_string()]);
    }

    #[tokio::test]
    async fn pregame_without_deadline_is_silent() {
        let (engine, _) = engine().await;
        let mut game = snapshot(None);
        game.pregame = true;
        assert!(messages(&engine, &game, 1, Some(100), Utc::now()).await.is_empty());
    }

    #[tokio::test]
    async fn winner_unfollows() {
        let (engine, store) = engine().await;
        let now = Utc::now();
        let ch = ChannelId::new(1);
        let mut game = running(now, 0);
        game.won = Some("Russia".to_string());
        let _ = store.add_poller(game.game_id, ch).await;
        let _ = store.add_alarm(2, ch).await;

        // A forward jump and an alarm crossing are both masked by the win.
        let got = messages(&engine, &game, 1, Some(3 * HOUR), now).await;
        assert_eq!(got, vec!["Russia has won!"]);
        assert!(matches!(store.contains_poller(game.game_id, ch).await, Ok(false)));
    }

    #[tokio::test]
    async fn draw_unfollows() {
        let (engine, store) = engine().await;
        let now = Utc::now();
        let ch = ChannelId::new(1);
        let mut game = running(now, DAY);
        game.drawn = vec!["France".to_string(), "Russia".to_string()];
        let _ = store.add_poller(game.game_id, ch).await;

        let got = messages(&engine, &game, 1, Some(1000), now).await;
        assert_eq!(got, vec!["The game was a draw between France, Russia!"]);
        assert!(matches!(store.contains_poller(game.game_id, ch).await, Ok(false)));
    }

    #[tokio::test]
    async fn forward_jump_is_new_round_after_delay() {
        let (engine, store) = engine_with_delay(Duration::from_millis(50)).await;
        let now = Utc::now();
        let game = running(now, 86_000);
        let _ = store.add_poller(game.game_id, ChannelId::new(1)).await;

        let started = tokio::time::Instant::now();
        let got = messages(&engine, &game, 1, Some(1000), now).await;
        assert_eq!(got, vec!["Starting new round! Good luck :)"]);
        assert!(started.elapsed() >= Duration::from_millis(50));

        let Ok(pollers) = store.pollers().await else {
            panic!("scan succeeds");
        };
        assert_eq!(pollers.first().and_then(|p| p.last_delta), Some(86_000));

        // Same deadline on the next poll: nothing new.
        let again = messages(&engine, &game, 1, Some(86_000), now).await;
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn first_poll_only_records_delta() {
        let (engine, store) = engine().await;
        let now = Utc::now();
        let game = running(now, DAY);
        let _ = store.add_poller(game.game_id, ChannelId::new(1)).await;
        let _ = store.add_alarm(48, ChannelId::new(1)).await;

        assert!(messages(&engine, &game, 1, None, now).await.is_empty());
        let Ok(pollers) = store.pollers().await else {
            panic!("scan succeeds");
        };
        assert_eq!(pollers.first().and_then(|p| p.last_delta), Some(DAY));
    }

    #[tokio::test]
    async fn alarm_crossing_everybody_ready() {
        let (engine, store) = engine().await;
        let now = Utc::now();
        let _ = store.add_alarm(2, ChannelId::new(1)).await;
        let game = running(now, HOUR + 59 * MINUTE);

        let got = messages(&engine, &game, 1, Some(2 * HOUR + MINUTE), now).await;
        assert_eq!(got, vec!["2h left, everybody's ready!"]);
    }

    #[tokio::test]
    async fn alarm_crossing_lists_not_ready() {
        let (engine, store) = engine().await;
        let now = Utc::now();
        let _ = store.add_alarm(2, ChannelId::new(1)).await;
        let mut game = running(now, HOUR + 59 * MINUTE);
        game.not_ready = vec!["Turkey".to_string(), "France".to_string()];

        let got = messages(&engine, &game, 1, Some(2 * HOUR + MINUTE), now).await;
        assert_eq!(got, vec!["2h left! These countries aren't ready: Turkey, France"]);
    }

    #[tokio::test]
    async fn alarm_fires_once_and_only_for_its_channel() {
        let (engine, store) = engine().await;
        let now = Utc::now();
        let _ = store.add_alarm(2, ChannelId::new(7)).await;
        let game = running(now, HOUR + 59 * MINUTE);

        // Other channel: no alarm registered.
        assert!(messages(&engine, &game, 1, Some(2 * HOUR + MINUTE), now).await.is_empty());
        // Already below the threshold on the previous poll.
        assert!(messages(&engine, &game, 7, Some(HOUR + 59 * MINUTE + 30), now).await.is_empty());
        // Exactly at the threshold counts as crossed.
        let at = running(now, 2 * HOUR);
        assert_eq!(
            messages(&engine, &at, 7, Some(2 * HOUR + 30), now).await,
            vec!["2h left, everybody's ready!"]
        );
    }

    #[tokio::test]
    async fn every_crossed_alarm_is_reported() {
        let (engine, store) = engine().await;
        let now = Utc::now();
        let ch = ChannelId::new(1);
        let _ = store.add_alarm(24, ch).await;
        let _ = store.add_alarm(2, ch).await;
        let game = running(now, HOUR);

        let got = messages(&engine, &game, 1, Some(2 * DAY), now).await;
        assert_eq!(
            got,
            vec!["24h left, everybody's ready!", "2h left, everybody's ready!"]
        );
    }

    #[tokio::test]
    async fn no_deadline_keeps_prior_delta() {
        let (engine, store) = engine().await;
        let game = snapshot(None);
        let ch = ChannelId::new(1);
        let _ = store.add_poller(game.game_id, ch).await;
        let _ = store.update_poller_delta(game.game_id, ch, 500).await;

        assert!(messages(&engine, &game, 1, Some(500), Utc::now()).await.is_empty());
        let Ok(pollers) = store.pollers().await else {
            panic!("scan succeeds");
        };
        assert_eq!(pollers.first().and_then(|p| p.last_delta), Some(500));
    }

    #[test]
    fn terminal_transitions() {
        assert!(Transition::Won { winner: "Russia".to_string() }.is_terminal());
        assert!(!Transition::NewRound.is_terminal());
    }
}
