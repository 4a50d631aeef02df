//! Cooperative shutdown signal.
//!
//! [`Shutdown`] wraps a [`tokio::sync::watch`] channel. Long sleeps (the
//! poll interval, fetch backoff) go through [`Shutdown::sleep`] so a Ctrl-C
//! ends them early instead of waiting them out.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

/// Sender half, held by `main`.
#[derive(Debug)]
pub struct ShutdownTrigger {
    sender: watch::Sender<bool>,
}

impl ShutdownTrigger {
    /// Signals every [`Shutdown`] handle.
    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }
}

/// Receiver half, cloned into every task that sleeps.
#[derive(Debug, Clone)]
pub struct Shutdown {
    receiver: watch::Receiver<bool>,
    _keepalive: Option<Arc<watch::Sender<bool>>>,
}

impl Shutdown {
    /// Creates a linked trigger/handle pair.
    #[must_use]
    pub fn new() -> (ShutdownTrigger, Self) {
        let (sender, receiver) = watch::channel(false);
        (
            ShutdownTrigger { sender },
            Self {
                receiver,
                _keepalive: None,
            },
        )
    }

    /// A handle that never fires, for tests and one-off tools.
    #[must_use]
    pub fn never() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            receiver,
            _keepalive: Some(Arc::new(sender)),
        }
    }

    /// Returns `true` once shutdown was requested.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves when shutdown is requested.
    pub async fn wait(&mut self) {
        // An error means the trigger was dropped; treat that as shutdown.
        let _ = self.receiver.wait_for(|stop| *stop).await;
    }

    /// Sleeps for `duration` unless shutdown fires first.
    ///
    /// Returns `true` if the full duration elapsed, `false` if shutdown
    /// interrupted it.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        if self.is_triggered() {
            return false;
        }
        tokio::select! {
            () = tokio::time::sleep(duration) => true,
            () = self.wait() => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn sleep_completes_without_trigger() {
        let mut shutdown = Shutdown::never();
        assert!(shutdown.sleep(Duration::from_secs(30)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_interrupts_sleep() {
        let (trigger, mut shutdown) = Shutdown::new();
        let handle = tokio::spawn(async move { shutdown.sleep(Duration::from_secs(3600)).await });
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.trigger();
        let completed = handle.await.unwrap_or(true);
        assert!(!completed);
    }

    #[test]
    fn wait_is_pending_until_triggered() {
        let (trigger, mut shutdown) = Shutdown::new();
        let mut wait = tokio_test::task::spawn(shutdown.wait());
        tokio_test::assert_pending!(wait.poll());
        trigger.trigger();
        assert!(wait.is_woken());
        tokio_test::assert_ready!(wait.poll());
    }

    #[tokio::test]
    async fn triggered_handle_returns_immediately() {
        let (trigger, mut shutdown) = Shutdown::new();
        trigger.trigger();
        assert!(shutdown.is_triggered());
        assert!(!shutdown.sleep(Duration::from_secs(3600)).await);
    }
}
