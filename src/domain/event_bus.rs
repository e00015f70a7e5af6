//! Fan-out of settlement events.
//!
//! Pool mutations publish while still ordered by the pool's write lock, so
//! every receiver observes one pool's lifecycle (created, deposits and
//! withdrawals, initiated, finalized, claims) in the order it happened.
//! WebSocket connections and the event-log recorder each hold a receiver.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;

use super::PoolEvent;

/// Broadcast bus for [`PoolEvent`]s with a running publication count.
///
/// Receivers that fall more than `capacity` events behind lose the oldest
/// ones and see [`broadcast::error::RecvError::Lagged`]. The registry is the
/// record of truth; the bus only reports changes to it.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PoolEvent>,
    published: Arc<AtomicU64>,
}

impl EventBus {
    /// Creates a bus buffering up to `capacity` events per receiver.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            published: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Publishes `event` and returns how many receivers got it.
    ///
    /// The event is counted even when nobody is listening.
    pub fn publish(&self, event: PoolEvent) -> usize {
        let event_type = event.event_type_str();
        let pool_id = event.pool_id();
        let sequence = self.published.fetch_add(1, Ordering::Relaxed);
        let delivered = self.sender.send(event).unwrap_or(0);
        tracing::trace!(%pool_id, event_type, sequence, delivered, "settlement event published");
        delivered
    }

    /// Returns a receiver for events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.sender.subscribe()
    }

    /// Number of live receivers (WebSocket clients plus the recorder).
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Total events published since start-up.
    #[must_use]
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{ParticipantId, PoolId};
    use chrono::Utc;

    fn deposited(pool: u64, who: &str, amount: u128) -> PoolEvent {
        PoolEvent::Deposited {
            pool_id: PoolId::new(pool),
            participant: ParticipantId::new(who),
            amount: amount.to_string(),
            pool_total: amount.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn unobserved_events_are_still_counted() {
        let bus = EventBus::new(8);
        assert_eq!(bus.publish(deposited(0, "alice", 5)), 0);
        assert_eq!(bus.publish(deposited(1, "bob", 7)), 0);
        assert_eq!(bus.published_count(), 2);
    }

    #[tokio::test]
    async fn receivers_see_publication_order_across_pools() {
        let bus = EventBus::new(8);
        let mut ws = bus.subscribe();
        let mut recorder = bus.subscribe();
        assert_eq!(bus.receiver_count(), 2);

        assert_eq!(bus.publish(deposited(2, "alice", 10)), 2);
        bus.publish(deposited(0, "bob", 20));

        for rx in [&mut ws, &mut recorder] {
            let (Ok(first), Ok(second)) = (rx.recv().await, rx.recv().await) else {
                panic!("expected two events");
            };
            assert_eq!(first.pool_id(), PoolId::new(2));
            assert_eq!(second.pool_id(), PoolId::new(0));
        }
    }

    #[tokio::test]
    async fn slow_receiver_is_told_how_much_it_missed() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for amount in 1..=4 {
            bus.publish(deposited(0, "alice", amount));
        }

        let Err(broadcast::error::RecvError::Lagged(missed)) = rx.recv().await else {
            panic!("receiver should have lagged");
        };
        assert_eq!(missed, 2);
        let Ok(PoolEvent::Deposited { amount, .. }) = rx.recv().await else {
            panic!("expected the oldest retained deposit");
        };
        assert_eq!(amount, "3");
    }

    #[test]
    fn dropped_receivers_stop_counting() {
        let bus = EventBus::new(8);
        let rx = bus.subscribe();
        let clone = bus.clone();
        assert_eq!(clone.receiver_count(), 1);
        drop(rx);
        assert_eq!(bus.receiver_count(), 0);
        clone.publish(deposited(0, "alice", 1));
        assert_eq!(bus.published_count(), 1);
    }
}
