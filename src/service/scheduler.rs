//! Periodic poll loop.
//!
//! [`PollScheduler::run`] sleeps first and polls second: at startup the chat
//! bridge is usually not connected yet, so an immediate poll could not
//! deliver anything. Each cycle walks the pollers present at its start;
//! a failure on one poller is logged and never affects the others.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use super::transition::TransitionEngine;
use crate::domain::{GameEmbed, OutboundMessage};
use crate::error::RelayError;
use crate::gateway::ChatGateway;
use crate::persistence::{Poller, SubscriptionStore};
use crate::shutdown::Shutdown;
use crate::source::GameSource;

/// Notice sent when a followed game can no longer be read.
pub const CANCELLED_NOTICE: &str = "The game seems to be cancelled! Unfollowing..";

/// Outcome counters of one poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Pollers processed.
    pub polled: usize,
    /// Messages handed to the gateway.
    pub delivered: usize,
    /// Pollers removed because their game is invalid.
    pub cancelled: usize,
    /// Pollers skipped because of an error.
    pub failed: usize,
}

/// Drives the fetch → evaluate → deliver pipeline.
#[derive(Clone)]
pub struct PollScheduler {
    store: Arc<dyn SubscriptionStore>,
    source: Arc<dyn GameSource>,
    engine: TransitionEngine,
    gateway: Arc<dyn ChatGateway>,
    interval: Duration,
}

impl std::fmt::Debug for PollScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollScheduler")
            .field("engine", &self.engine)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl PollScheduler {
    /// Creates a scheduler polling every `interval`.
    #[must_use]
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        source: Arc<dyn GameSource>,
        engine: TransitionEngine,
        gateway: Arc<dyn ChatGateway>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            source,
            engine,
            gateway,
            interval,
        }
    }

    /// Polls forever until `shutdown` fires.
    pub async fn run(self, mut shutdown: Shutdown) {
        tracing::info!(interval = ?self.interval, "poll scheduler started");
        while shutdown.sleep(self.interval).await {
            let report = self.run_cycle().await;
            tracing::debug!(?report, "poll cycle finished");
        }
        tracing::info!("poll scheduler stopped");
    }

    /// Runs one pass over every poller.
    pub async fn run_cycle(&self) -> CycleReport {
        let mut report = CycleReport::default();
        let pollers = match self.store.pollers().await {
            Ok(pollers) => pollers,
            Err(e) => {
                tracing::warn!(error = %e, "cannot list pollers, skipping cycle");
                return report;
            }
        };

        for poller in pollers {
            report.polled = report.polled.saturating_add(1);
            match self.poll_one(&poller).await {
                Ok(delivered) => {
                    report.delivered = report.delivered.saturating_add(delivered);
                }
                Err(RelayError::InvalidGame(reason)) => {
                    tracing::info!(
                        game_id = %poller.game_id,
                        channel = %poller.channel_id,
                        %reason,
                        "game looks cancelled, unfollowing"
                    );
                    report.cancelled = report.cancelled.saturating_add(1);
                    if let Err(e) = self
                        .store
                        .remove_poller(poller.game_id, poller.channel_id)
                        .await
                    {
                        tracing::warn!(error = %e, "failed to remove cancelled poller");
                    }
                    if self
                        .deliver(&poller, OutboundMessage::from(CANCELLED_NOTICE))
                        .await
                    {
                        report.delivered = report.delivered.saturating_add(1);
                    }
                }
                Err(RelayError::ShuttingDown) => break,
                Err(e) => {
                    report.failed = report.failed.saturating_add(1);
                    tracing::warn!(
                        game_id = %poller.game_id,
                        channel = %poller.channel_id,
                        error = %e,
                        "poll failed"
                    );
                }
            }
        }
        report
    }

    /// Fetches and evaluates one poller; returns the number of messages
    /// delivered.
    async fn poll_one(&self, poller: &Poller) -> Result<usize, RelayError> {
        let game = self.source.fetch(poller.game_id).await?;
        let transitions = self
            .engine
            .evaluate(&game, poller.channel_id, poller.last_delta, Utc::now())
            .await?;

        let mut delivered = 0;
        for transition in transitions {
            let embed = GameEmbed::for_game(&game, transition.to_string());
            if self.deliver(poller, OutboundMessage::Embed(embed)).await {
                delivered += 1;
            }
        }
        Ok(delivered)
    }

    async fn deliver(&self, poller: &Poller, message: OutboundMessage) -> bool {
        let text = message.text().to_string();
        match self.gateway.send(poller.channel_id, message).await {
            Ok(()) => {
                tracing::info!(
                    game_id = %poller.game_id,
                    channel = %poller.channel_id,
                    message = %text,
                    "notification sent"
                );
                true
            }
            Err(e) => {
                tracing::warn!(
                    game_id = %poller.game_id,
                    channel = %poller.channel_id,
                    error = %e,
                    "notification not delivered"
                );
                false
            }
        }
    }
}
