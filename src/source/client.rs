//! HTTP client for webDiplomacy board pages.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::parser::{PageParser, ParsedPage, RegexPageParser};
use crate::domain::{GameId, GameSnapshot};
use crate::error::RelayError;
use crate::shutdown::Shutdown;

/// Path of a game board page relative to the service base URL.
const BOARD_ENDPOINT: &str = "board.php?gameID=";

/// Source of game snapshots.
///
/// Implementations must return [`RelayError::InvalidGame`] when the game
/// can never be read (cancelled, never existed) and
/// [`RelayError::FetchFailed`] when the service kept failing.
#[async_trait]
pub trait GameSource: Send + Sync {
    /// Fetches and parses the current state of `game_id`.
    async fn fetch(&self, game_id: GameId) -> Result<GameSnapshot, RelayError>;
}

/// Retry schedule for failing requests.
///
/// The first retry waits `initial`, every following one twice as long.
/// Once the next wait would push the accumulated wait time past
/// `threshold`, the failure is returned instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// First retry delay.
    pub initial: Duration,
    /// Upper bound on the accumulated retry delay.
    pub threshold: Duration,
}

impl BackoffPolicy {
    /// Delays slept before giving up, in order.
    #[must_use]
    pub fn delays(&self) -> Vec<Duration> {
        let mut delays = Vec::new();
        let mut total = Duration::ZERO;
        let mut next = self.initial;
        while !next.is_zero() && total.saturating_add(next) <= self.threshold {
            delays.push(next);
            total = total.saturating_add(next);
            next = next.saturating_mul(2);
        }
        delays
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            threshold: Duration::from_secs(300),
        }
    }
}

/// [`GameSource`] backed by the public webDiplomacy website.
pub struct WebDiplomacyClient {
    http: reqwest::Client,
    base_url: String,
    parser: Arc<dyn PageParser>,
    backoff: BackoffPolicy,
    shutdown: Shutdown,
    last_cache_token: AtomicI64,
}

impl std::fmt::Debug for WebDiplomacyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebDiplomacyClient")
            .field("base_url", &self.base_url)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

impl WebDiplomacyClient {
    /// Creates a client for the service rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Configuration`] if the HTTP client cannot be
    /// built (e.g. no TLS backend available).
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
        backoff: BackoffPolicy,
        shutdown: Shutdown,
    ) -> Result<Self, RelayError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("diplomacy-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RelayError::Configuration(format!("http client: {e}")))?;

        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            http,
            base_url,
            parser: Arc::new(RegexPageParser),
            backoff,
            shutdown,
            last_cache_token: AtomicI64::new(0),
        })
    }

    /// Replaces the page parser.
    #[must_use]
    pub fn with_parser(mut self, parser: Arc<dyn PageParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Board page URL of `game_id`.
    #[must_use]
    pub fn board_url(&self, game_id: GameId) -> String {
        format!("{}{BOARD_ENDPOINT}{game_id}", self.base_url)
    }

    /// Performs a GET, retrying under the backoff policy.
    async fn request(&self, url: &str) -> Result<String, RelayError> {
        let mut shutdown = self.shutdown.clone();
        let mut delays = self.backoff.delays().into_iter();
        let mut attempts: u32 = 0;

        loop {
            attempts = attempts.saturating_add(1);
            let outcome = match self.http.get(url).send().await {
                Ok(response) => match response.error_for_status() {
                    Ok(response) => response.text().await,
                    Err(e) => Err(e),
                },
                Err(e) => Err(e),
            };

            let err = match outcome {
                Ok(body) => return Ok(body),
                Err(e) => e,
            };

            let Some(delay) = delays.next() else {
                tracing::error!(url, attempts, error = %err, "giving up on game page");
                return Err(RelayError::FetchFailed {
                    url: url.to_string(),
                    attempts,
                    reason: err.to_string(),
                });
            };

            tracing::warn!(url, attempts, retry_in = ?delay, error = %err, "fetch failed, retrying");
            if !shutdown.sleep(delay).await {
                return Err(RelayError::ShuttingDown);
            }
        }
    }

    /// Strictly increasing millisecond stamp appended to map URLs.
    fn next_cache_token(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let previous = self
            .last_cache_token
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last.saturating_add(1)))
            })
            .unwrap_or(now);
        now.max(previous.saturating_add(1))
    }
}

#[async_trait]
impl GameSource for WebDiplomacyClient {
    async fn fetch(&self, game_id: GameId) -> Result<GameSnapshot, RelayError> {
        let url = self.board_url(game_id);
        let body = self.request(&url).await?;
        let page = self.parser.parse(&body);
        build_snapshot(game_id, page, &self.base_url, url, self.next_cache_token())
    }
}

/// Assembles a [`GameSnapshot`] from parsed page fields.
///
/// # Errors
///
/// Returns [`RelayError::InvalidGame`] when a required field (title, date,
/// phase, map link) is missing or the deadline is not a valid timestamp.
pub fn build_snapshot(
    game_id: GameId,
    page: ParsedPage,
    base_url: &str,
    url: String,
    cache_token: i64,
) -> Result<GameSnapshot, RelayError> {
    let ParsedPage {
        title,
        date,
        phase,
        defeated,
        drawn,
        ready,
        not_ready,
        won,
        deadline,
        pregame,
        map_link,
    } = page;

    let deadline = match deadline.first() {
        Some(raw) => Some(parse_deadline(game_id, raw)?),
        None => None,
    };
    let map_link = required(game_id, map_link, "map link")?;
    let separator = if map_link.contains('?') { '&' } else { '?' };

    Ok(GameSnapshot {
        game_id,
        title: required(game_id, title, "title")?,
        date: required(game_id, date, "date")?,
        phase: required(game_id, phase, "phase")?,
        deadline,
        defeated,
        not_ready,
        ready,
        won: won.into_iter().next(),
        drawn,
        pregame: !pregame.is_empty(),
        url,
        map_url: format!("{base_url}{map_link}{separator}nocache={cache_token}"),
    })
}

fn required(game_id: GameId, values: Vec<String>, what: &str) -> Result<String, RelayError> {
    values
        .into_iter()
        .next()
        .ok_or_else(|| RelayError::InvalidGame(format!("game {game_id}: page has no {what}")))
}

fn parse_deadline(game_id: GameId, raw: &str) -> Result<DateTime<Utc>, RelayError> {
    raw.parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| RelayError::InvalidGame(format!("game {game_id}: bad deadline {raw:?}")))
}
