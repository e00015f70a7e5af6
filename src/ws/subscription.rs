//! Per-connection event filter.
//!
//! A client narrows the settlement event stream three ways: by pool (or
//! every pool via `"*"`), by participant, and by event kind. Pool-wide
//! events (creation, initiation, finalization) concern every participant,
//! so a participant filter never hides them.

use std::collections::HashSet;

use crate::domain::{ParticipantId, PoolEvent, PoolId};

/// Event kinds a client may select, as carried in `event_type`.
pub const EVENT_KINDS: [&str; 6] = [
    "pool_created",
    "deposited",
    "withdrawn",
    "swap_initiated",
    "swap_finalized",
    "share_claimed",
];

/// Filter deciding which [`PoolEvent`]s reach one WebSocket client.
#[derive(Debug, Default)]
pub struct EventFilter {
    pools: HashSet<PoolId>,
    all_pools: bool,
    participant: Option<ParticipantId>,
    kinds: HashSet<&'static str>,
}

impl EventFilter {
    /// Creates a filter that passes nothing until pools are added.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds pools to follow; `all` follows every pool, including ones
    /// created later.
    pub fn follow(&mut self, pools: &[PoolId], all: bool) {
        self.all_pools |= all;
        self.pools.extend(pools.iter().copied());
    }

    /// Stops following `pools`. The every-pool flag is left as is.
    pub fn unfollow(&mut self, pools: &[PoolId]) {
        for pool in pools {
            self.pools.remove(pool);
        }
    }

    /// Restricts participant-specific events to `who`; `None` lifts it.
    pub fn set_participant(&mut self, who: Option<ParticipantId>) {
        self.participant = who;
    }

    /// Restricts delivery to the given event kinds. Unknown names are
    /// rejected and returned; an empty list lifts the restriction.
    ///
    /// # Errors
    ///
    /// Returns the first name that is not one of [`EVENT_KINDS`].
    pub fn set_kinds(&mut self, kinds: &[String]) -> Result<(), String> {
        let mut selected = HashSet::new();
        for kind in kinds {
            let known = EVENT_KINDS
                .iter()
                .find(|k| **k == kind.as_str())
                .ok_or_else(|| kind.clone())?;
            selected.insert(*known);
        }
        self.kinds = selected;
        Ok(())
    }

    /// Returns `true` if `event` should be delivered.
    #[must_use]
    pub fn admits(&self, event: &PoolEvent) -> bool {
        let pool_ok = self.all_pools || self.pools.contains(&event.pool_id());
        let kind_ok = self.kinds.is_empty() || self.kinds.contains(event.event_type_str());
        let participant_ok = match (&self.participant, event.participant()) {
            (Some(wanted), Some(actual)) => wanted == actual,
            _ => true,
        };
        pool_ok && kind_ok && participant_ok
    }

    /// Explicitly followed pools, ascending.
    #[must_use]
    pub fn pools(&self) -> Vec<u64> {
        let mut pools: Vec<u64> = self.pools.iter().map(|p| p.get()).collect();
        pools.sort_unstable();
        pools
    }

    /// Whether every pool is followed.
    #[must_use]
    pub fn follows_all(&self) -> bool {
        self.all_pools
    }

    /// Participant restriction, if any.
    #[must_use]
    pub fn participant(&self) -> Option<&ParticipantId> {
        self.participant.as_ref()
    }

    /// Selected event kinds, sorted; empty when unrestricted.
    #[must_use]
    pub fn kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<&'static str> = self.kinds.iter().copied().collect();
        kinds.sort_unstable();
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SettlementHandle;
    use chrono::Utc;

    fn deposit(pool: u64, who: &str) -> PoolEvent {
        PoolEvent::Deposited {
            pool_id: PoolId::new(pool),
            participant: ParticipantId::new(who),
            amount: "10".to_string(),
            pool_total: "10".to_string(),
            timestamp: Utc::now(),
        }
    }

    fn finalized(pool: u64) -> PoolEvent {
        PoolEvent::SwapFinalized {
            pool_id: PoolId::new(pool),
            settlement_handle: SettlementHandle::new(1),
            realized_output: "99".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn fresh_filter_passes_nothing() {
        let filter = EventFilter::new();
        assert!(!filter.admits(&deposit(0, "alice")));
        assert!(!filter.admits(&finalized(0)));
    }

    #[test]
    fn followed_pools_only() {
        let mut filter = EventFilter::new();
        filter.follow(&[PoolId::new(4), PoolId::new(2), PoolId::new(4)], false);
        assert!(filter.admits(&deposit(4, "alice")));
        assert!(!filter.admits(&deposit(5, "alice")));
        assert_eq!(filter.pools(), vec![2, 4]);

        filter.unfollow(&[PoolId::new(4)]);
        assert!(!filter.admits(&deposit(4, "alice")));
    }

    #[test]
    fn wildcard_survives_unfollow() {
        let mut filter = EventFilter::new();
        filter.follow(&[PoolId::new(1)], true);
        filter.unfollow(&[PoolId::new(1)]);
        assert!(filter.follows_all());
        assert!(filter.admits(&deposit(1, "bob")));
        assert!(filter.admits(&finalized(u64::MAX)));
    }

    #[test]
    fn participant_filter_keeps_pool_wide_events() {
        let mut filter = EventFilter::new();
        filter.follow(&[], true);
        filter.set_participant(Some(ParticipantId::new("alice")));

        assert!(filter.admits(&deposit(0, "alice")));
        assert!(!filter.admits(&deposit(0, "bob")));
        assert!(filter.admits(&finalized(0)));
    }

    #[test]
    fn kind_filter_rejects_unknown_names() {
        let mut filter = EventFilter::new();
        filter.follow(&[PoolId::new(0)], false);
        assert_eq!(
            filter.set_kinds(&["swap_finalized".to_string(), "swap".to_string()]),
            Err("swap".to_string())
        );
        assert!(filter.kinds().is_empty());

        assert_eq!(filter.set_kinds(&["swap_finalized".to_string()]), Ok(()));
        assert!(filter.admits(&finalized(0)));
        assert!(!filter.admits(&deposit(0, "alice")));

        assert_eq!(filter.set_kinds(&[]), Ok(()));
        assert!(filter.admits(&deposit(0, "alice")));
    }
}
