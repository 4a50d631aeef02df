//! Relay configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Only `BOT_TOKEN` is mandatory.

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::RelayError;
use crate::source::BackoffPolicy;

/// Top-level relay configuration.
///
/// Loaded once at startup via [`RelayConfig::from_env`].
#[derive(Clone)]
pub struct RelayConfig {
    /// Shared secret the chat bridge presents as a bearer token.
    pub bot_token: String,

    /// Socket address to bind the bridge server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// SQLite connection string for the subscription store.
    pub database_url: String,

    /// Base URL of the game service, with a trailing slash.
    pub webdiplomacy_url: String,

    /// Seconds between two poll cycles.
    pub poll_interval_secs: u64,

    /// Seconds to wait before announcing a new round, so the remote map
    /// image has been regenerated.
    pub map_regeneration_secs: u64,

    /// First retry delay of a failing fetch, in seconds.
    pub fetch_initial_backoff_secs: u64,

    /// Accumulated retry delay after which a fetch failure is surfaced.
    pub fetch_backoff_threshold_secs: u64,

    /// Per-request HTTP timeout in seconds.
    pub request_timeout_secs: u64,

    /// Capacity of the EventBus broadcast channel.
    pub event_bus_capacity: usize,

    /// Words that address the bot, compared case-insensitively.
    pub trigger_words: Vec<String>,
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("bot_token", &"<redacted>")
            .field("listen_addr", &self.listen_addr)
            .field("database_url", &self.database_url)
            .field("webdiplomacy_url", &self.webdiplomacy_url)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("map_regeneration_secs", &self.map_regeneration_secs)
            .field("fetch_initial_backoff_secs", &self.fetch_initial_backoff_secs)
            .field(
                "fetch_backoff_threshold_secs",
                &self.fetch_backoff_threshold_secs,
            )
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("event_bus_capacity", &self.event_bus_capacity)
            .field("trigger_words", &self.trigger_words)
            .finish()
    }
}

impl RelayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults for every variable except `BOT_TOKEN`.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Configuration`] if `BOT_TOKEN` is missing or
    /// empty, or if `LISTEN_ADDR` cannot be parsed as a [`SocketAddr`].
    pub fn from_env() -> Result<Self, RelayError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, RelayError> {
        let bot_token = lookup("BOT_TOKEN")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                RelayError::Configuration("missing environment variable BOT_TOKEN".to_string())
            })?;

        let listen_addr: SocketAddr = lookup("LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".to_string())
            .parse()
            .map_err(|e| RelayError::Configuration(format!("invalid LISTEN_ADDR: {e}")))?;

        let database_url = lookup("DATABASE_URL")
            .unwrap_or_else(|| "sqlite://diplomacy-relay.db?mode=rwc".to_string());

        let mut webdiplomacy_url =
            lookup("WEBDIPLOMACY_URL").unwrap_or_else(|| "https://webdiplomacy.net/".to_string());
        if !webdiplomacy_url.ends_with('/') {
            webdiplomacy_url.push('/');
        }

        let trigger_words = lookup("TRIGGER_WORDS")
            .map(|raw| {
                raw.split(',')
                    .map(|w| w.trim().to_lowercase())
                    .filter(|w| !w.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|words| !words.is_empty())
            .unwrap_or_else(|| vec!["svetlana".to_string(), "svet".to_string()]);

        Ok(Self {
            bot_token,
            listen_addr,
            database_url,
            webdiplomacy_url,
            poll_interval_secs: parse_value(&lookup, "POLL_INTERVAL_SECS", 30),
            map_regeneration_secs: parse_value(&lookup, "MAP_REGENERATION_SECS", 10),
            fetch_initial_backoff_secs: parse_value(&lookup, "FETCH_INITIAL_BACKOFF_SECS", 1),
            fetch_backoff_threshold_secs: parse_value(&lookup, "FETCH_BACKOFF_THRESHOLD_SECS", 300),
            request_timeout_secs: parse_value(&lookup, "REQUEST_TIMEOUT_SECS", 15),
            event_bus_capacity: parse_value(&lookup, "EVENT_BUS_CAPACITY", 1024),
            trigger_words,
        })
    }

    /// Poll period as a [`Duration`].
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// New-round announcement delay as a [`Duration`].
    #[must_use]
    pub const fn map_regeneration_delay(&self) -> Duration {
        Duration::from_secs(self.map_regeneration_secs)
    }

    /// Per-request timeout of the game source.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Retry schedule of the game source.
    #[must_use]
    pub const fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy {
            initial: Duration::from_secs(self.fetch_initial_backoff_secs),
            threshold: Duration::from_secs(self.fetch_backoff_threshold_secs),
        }
    }
}

/// Parses a looked-up value as `T`, returning `default` on missing or
/// invalid values.
fn parse_value<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<RelayConfig, RelayError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        RelayConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn missing_token_is_fatal() {
        let result = load(&[]);
        assert!(matches!(result, Err(RelayError::Configuration(_))));
        let blank = load(&[("BOT_TOKEN", "  ")]);
        assert!(blank.is_err());
    }

    #[test]
    fn defaults_apply() {
        let Ok(config) = load(&[("BOT_TOKEN", "foobar")]) else {
            panic!("token is set");
        };
        assert_eq!(config.bot_token, "foobar");
        assert_eq!(config.webdiplomacy_url, "https://webdiplomacy.net/");
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
        assert_eq!(config.map_regeneration_delay(), Duration::from_secs(10));
        assert_eq!(config.backoff(), BackoffPolicy::default());
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
        assert_eq!(config.trigger_words, vec!["svetlana", "svet"]);
    }

    #[test]
    fn overrides_are_parsed() {
        let Ok(config) = load(&[
            ("BOT_TOKEN", "t"),
            ("WEBDIPLOMACY_URL", "http://localhost:8080"),
            ("POLL_INTERVAL_SECS", "5"),
            ("TRIGGER_WORDS", "Relay, R"),
            ("EVENT_BUS_CAPACITY", "not-a-number"),
        ]) else {
            panic!("valid config");
        };
        assert_eq!(config.webdiplomacy_url, "http://localhost:8080/");
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.trigger_words, vec!["relay", "r"]);
        assert_eq!(config.event_bus_capacity, 1024);
    }

    #[test]
    fn bad_listen_addr_is_rejected() {
        let result = load(&[("BOT_TOKEN", "t"), ("LISTEN_ADDR", "nowhere")]);
        assert!(result.is_err());
    }

    #[test]
    fn debug_redacts_token() {
        let Ok(config) = load(&[("BOT_TOKEN", "s3cret")]) else {
            panic!("valid config");
        };
        assert!(!format!("{config:?}").contains("s3cret"));
    }
}
