//! SQLite implementation of the subscription store.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use super::SubscriptionStore;
use super::models::{Alarm, Poller};
use crate::domain::{ChannelId, GameId};
use crate::error::RelayError;

/// SQLite-backed subscription store using `sqlx::SqlitePool`.
///
/// The pool holds a single connection, so every statement from the poll
/// scheduler and the command interpreter runs one at a time. Each
/// mutation is a single autocommitted statement.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `database_url` and runs
    /// the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Persistence`] if the URL is invalid, the file
    /// cannot be opened or a migration fails.
    pub async fn connect(database_url: &str) -> Result<Self, RelayError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Persistence`] if the migrations fail.
    pub async fn in_memory() -> Result<Self, RelayError> {
        Self::connect("sqlite::memory:").await
    }

    /// Wraps an existing pool and runs the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Persistence`] if a migration fails.
    pub async fn with_pool(pool: SqlitePool) -> Result<Self, RelayError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Closes the underlying pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn poller_from_row(
    (game, channel, last_delta): (i64, i64, Option<i64>),
) -> Result<Poller, RelayError> {
    let game_id = GameId::new(game)
        .map_err(|e| RelayError::Persistence(format!("corrupt poller row: {e}")))?;
    Ok(Poller {
        game_id,
        channel_id: ChannelId::new(channel),
        last_delta,
    })
}

fn alarm_from_row((hours, channel): (i64, i64)) -> Result<Alarm, RelayError> {
    let hours = u32::try_from(hours)
        .map_err(|e| RelayError::Persistence(format!("corrupt alarm row: {e}")))?;
    Ok(Alarm {
        hours,
        channel_id: ChannelId::new(channel),
    })
}

#[async_trait]
impl SubscriptionStore for SqliteStore {
    async fn contains_poller(&self, game: GameId, channel: ChannelId) -> Result<bool, RelayError> {
        let found = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM pollers WHERE game = ? AND channel = ?)",
        )
        .bind(game.get())
        .bind(channel.get())
        .fetch_one(&self.pool)
        .await?;
        Ok(found)
    }

    async fn add_poller(&self, game: GameId, channel: ChannelId) -> Result<bool, RelayError> {
        let result = sqlx::query(
            "INSERT INTO pollers (game, channel) VALUES (?, ?) \
             ON CONFLICT (game, channel) DO NOTHING",
        )
        .bind(game.get())
        .bind(channel.get())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_poller(&self, game: GameId, channel: ChannelId) -> Result<bool, RelayError> {
        let result = sqlx::query("DELETE FROM pollers WHERE game = ? AND channel = ?")
            .bind(game.get())
            .bind(channel.get())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_poller_delta(
        &self,
        game: GameId,
        channel: ChannelId,
        seconds: i64,
    ) -> Result<(), RelayError> {
        sqlx::query("UPDATE pollers SET last_delta = ? WHERE game = ? AND channel = ?")
            .bind(seconds)
            .bind(game.get())
            .bind(channel.get())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn pollers(&self) -> Result<Vec<Poller>, RelayError> {
        let rows = sqlx::query_as::<_, (i64, i64, Option<i64>)>(
            "SELECT game, channel, last_delta FROM pollers ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(poller_from_row).collect()
    }

    async fn pollers_for_channel(&self, channel: ChannelId) -> Result<Vec<Poller>, RelayError> {
        let rows = sqlx::query_as::<_, (i64, i64, Option<i64>)>(
            "SELECT game, channel, last_delta FROM pollers WHERE channel = ? ORDER BY id ASC",
        )
        .bind(channel.get())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(poller_from_row).collect()
    }

    async fn contains_alarm(&self, hours: u32, channel: ChannelId) -> Result<bool, RelayError> {
        let found = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM alarms WHERE hours = ? AND channel = ?)",
        )
        .bind(i64::from(hours))
        .bind(channel.get())
        .fetch_one(&self.pool)
        .await?;
        Ok(found)
    }

    async fn add_alarm(&self, hours: u32, channel: ChannelId) -> Result<bool, RelayError> {
        let result = sqlx::query(
            "INSERT INTO alarms (hours, channel) VALUES (?, ?) \
             ON CONFLICT (hours, channel) DO NOTHING",
        )
        .bind(i64::from(hours))
        .bind(channel.get())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_alarm(&self, hours: u32, channel: ChannelId) -> Result<bool, RelayError> {
        let result = sqlx::query("DELETE FROM alarms WHERE hours = ? AND channel = ?")
            .bind(i64::from(hours))
            .bind(channel.get())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn alarms(&self) -> Result<Vec<Alarm>, RelayError> {
        let rows = sqlx::query_as::<_, (i64, i64)>(
            "SELECT hours, channel FROM alarms ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(alarm_from_row).collect()
    }

    async fn alarms_for_channel(&self, channel: ChannelId) -> Result<Vec<Alarm>, RelayError> {
        let rows = sqlx::query_as::<_, (i64, i64)>(
            "SELECT hours, channel FROM alarms WHERE channel = ? ORDER BY id ASC",
        )
        .bind(channel.get())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(alarm_from_row).collect()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    async fn store() -> SqliteStore {
        let Ok(store) = SqliteStore::in_memory().await else {
            panic!("in-memory store opens");
        };
        store
    }

    fn game(id: i64) -> GameId {
        let Ok(id) = GameId::new(id) else {
            panic!("valid id");
        };
        id
    }

    #[tokio::test]
    async fn pollers_iterate_in_insertion_order() {
        let store = store().await;
        let data = [(1, 2), (3, 4), (2, 2)];
        for (g, c) in data {
            assert!(matches!(
                store.add_poller(game(g), ChannelId::new(c)).await,
                Ok(true)
            ));
        }

        let Ok(pollers) = store.pollers().await else {
            panic!("scan succeeds");
        };
        let pairs: Vec<(i64, i64)> = pollers
            .iter()
            .map(|p| (p.game_id.get(), p.channel_id.get()))
            .collect();
        assert_eq!(pairs, data);
        assert!(pollers.iter().all(|p| p.last_delta.is_none()));

        assert!(matches!(store.contains_poller(game(1), ChannelId::new(2)).await, Ok(true)));
        assert!(matches!(store.contains_poller(game(1), ChannelId::new(3)).await, Ok(false)));
    }

    #[tokio::test]
    async fn duplicate_add_and_missing_remove_signal_false() {
        let store = store().await;
        let (g, c) = (game(1234), ChannelId::new(1));

        assert!(matches!(store.add_poller(g, c).await, Ok(true)));
        assert!(matches!(store.add_poller(g, c).await, Ok(false)));
        assert_eq!(store.pollers().await.map(|p| p.len()).unwrap_or(0), 1);

        assert!(matches!(store.remove_poller(g, c).await, Ok(true)));
        assert!(matches!(store.remove_poller(g, c).await, Ok(false)));
        assert!(matches!(store.contains_poller(g, c).await, Ok(false)));
    }

    #[tokio::test]
    async fn delta_updates_only_target_pair() {
        let store = store().await;
        let _ = store.add_poller(game(1), ChannelId::new(1)).await;
        let _ = store.add_poller(game(1), ChannelId::new(2)).await;

        assert!(store
            .update_poller_delta(game(1), ChannelId::new(2), 7200)
            .await
            .is_ok());

        let Ok(pollers) = store.pollers().await else {
            panic!("scan succeeds");
        };
        let deltas: Vec<Option<i64>> = pollers.iter().map(|p| p.last_delta).collect();
        assert_eq!(deltas, vec![None, Some(7200)]);
    }

    #[tokio::test]
    async fn alarms_are_keyed_by_hours_and_channel() {
        let store = store().await;
        let ch = ChannelId::new(1);

        assert!(matches!(store.add_alarm(2, ch).await, Ok(true)));
        assert!(matches!(store.add_alarm(3, ch).await, Ok(true)));
        assert!(matches!(store.add_alarm(2, ch).await, Ok(false)));
        assert!(matches!(store.add_alarm(2, ChannelId::new(5)).await, Ok(true)));

        assert!(matches!(store.remove_alarm(2, ch).await, Ok(true)));
        assert!(matches!(store.remove_alarm(2, ch).await, Ok(false)));
        assert!(matches!(store.contains_alarm(3, ch).await, Ok(true)));

        let Ok(mine) = store.alarms_for_channel(ch).await else {
            panic!("scan succeeds");
        };
        assert_eq!(mine, vec![Alarm { hours: 3, channel_id: ch }]);
        assert_eq!(store.alarms().await.map(|a| a.len()).unwrap_or(0), 2);
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("temp dir");
        };
        let url = format!("sqlite://{}", dir.path().join("relay.db").display());

        let Ok(first) = SqliteStore::connect(&url).await else {
            panic!("file store opens");
        };
        let _ = first.add_poller(game(1337), ChannelId::new(9)).await;
        let _ = first.update_poller_delta(game(1337), ChannelId::new(9), 60).await;
        let _ = first.add_alarm(24, ChannelId::new(9)).await;
        first.close().await;

        let Ok(second) = SqliteStore::connect(&url).await else {
            panic!("file store reopens");
        };
        let Ok(pollers) = second.pollers().await else {
            panic!("scan succeeds");
        };
        assert_eq!(
            pollers,
            vec![Poller {
                game_id: game(1337),
                channel_id: ChannelId::new(9),
                last_delta: Some(60),
            }]
        );
        assert!(matches!(second.contains_alarm(24, ChannelId::new(9)).await, Ok(true)));
    }
}
