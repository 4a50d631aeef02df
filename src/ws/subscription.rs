//! Per-connection channel subscriptions.
//!
//! Tracks which chat channels a bridge connection serves and filters
//! outbound events server-side. Every change is reported back so the
//! connection can keep the shared [`crate::gateway::ChannelDirectory`]
//! in step.

use std::collections::HashSet;

use crate::domain::ChannelId;

/// Manages the set of channels served by a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Served channels. If `subscribe_all` is true, this set is ignored
    /// for matching but still tracked.
    channel_ids: HashSet<ChannelId>,
    /// Whether the connection serves every channel (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds channels; `wildcard` enables the catch-all.
    ///
    /// Returns the channels that were not served before, and whether the
    /// wildcard was newly enabled.
    pub fn subscribe(&mut self, ids: &[ChannelId], wildcard: bool) -> (Vec<ChannelId>, bool) {
        let added = ids
            .iter()
            .copied()
            .filter(|id| self.channel_ids.insert(*id))
            .collect();
        let wildcard_added = wildcard && !self.subscribe_all;
        self.subscribe_all |= wildcard;
        (added, wildcard_added)
    }

    /// Removes channels; `wildcard` disables the catch-all.
    ///
    /// Returns the channels that were actually served, and whether the
    /// wildcard was switched off.
    pub fn unsubscribe(&mut self, ids: &[ChannelId], wildcard: bool) -> (Vec<ChannelId>, bool) {
        let removed = ids
            .iter()
            .copied()
            .filter(|id| self.channel_ids.remove(id))
            .collect();
        let wildcard_removed = wildcard && self.subscribe_all;
        if wildcard {
            self.subscribe_all = false;
        }
        (removed, wildcard_removed)
    }

    /// Clears everything, returning what was served.
    pub fn clear(&mut self) -> (Vec<ChannelId>, bool) {
        let wildcard = std::mem::take(&mut self.subscribe_all);
        (self.channel_ids.drain().collect(), wildcard)
    }

    /// Returns `true` if events for `channel` go to this connection.
    #[must_use]
    pub fn matches(&self, channel: ChannelId) -> bool {
        self.subscribe_all || self.channel_ids.contains(&channel)
    }

    /// Returns the number of explicitly served channels.
    #[must_use]
    pub fn count(&self) -> usize {
        self.channel_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: ChannelId = ChannelId::new(1);
    const B: ChannelId = ChannelId::new(2);

    #[test]
    fn empty_matches_nothing() {
        let mgr = SubscriptionManager::new();
        assert!(!mgr.matches(A));
    }

    #[test]
    fn subscribe_reports_only_new_channels() {
        let mut mgr = SubscriptionManager::new();
        assert_eq!(mgr.subscribe(&[A], false), (vec![A], false));
        assert_eq!(mgr.subscribe(&[A, B], false), (vec![B], false));
        assert!(mgr.matches(A));
        assert!(mgr.matches(B));
        assert!(!mgr.matches(ChannelId::new(3)));
        assert_eq!(mgr.count(), 2);
    }

    #[test]
    fn wildcard_matches_everything() {
        let mut mgr = SubscriptionManager::new();
        assert_eq!(mgr.subscribe(&[], true), (vec![], true));
        assert_eq!(mgr.subscribe(&[], true), (vec![], false));
        assert!(mgr.matches(ChannelId::new(99)));
        assert_eq!(mgr.unsubscribe(&[], true), (vec![], true));
        assert!(!mgr.is_subscribed_all());
    }

    #[test]
    fn unsubscribe_reports_only_served_channels() {
        let mut mgr = SubscriptionManager::new();
        let _ = mgr.subscribe(&[A], false);
        assert_eq!(mgr.unsubscribe(&[A, B], false), (vec![A], false));
        assert!(!mgr.matches(A));
    }

    #[test]
    fn clear_returns_everything() {
        let mut mgr = SubscriptionManager::new();
        let _ = mgr.subscribe(&[A], true);
        assert_eq!(mgr.clear(), (vec![A], true));
        assert_eq!(mgr.count(), 0);
        assert!(!mgr.is_subscribed_all());
    }
}
