//! Domain events reflecting pool state mutations.
//!
//! Every state change emits a [`PoolEvent`] through the [`super::EventBus`].
//! Events are broadcast to WebSocket subscribers and optionally persisted
//! to the PostgreSQL event log.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Asset, ParticipantId, PoolId, SettlementHandle};

/// Domain event emitted after every state mutation.
///
/// Amounts are stored as `String` to preserve u128 precision when
/// serialized to JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum PoolEvent {
    /// Emitted when a new pool is created.
    PoolCreated {
        /// Pool identifier.
        pool_id: PoolId,
        /// Source asset.
        source_asset: Asset,
        /// Target asset.
        target_asset: Asset,
        /// Resolved synthetic route.
        synthetic: Asset,
        /// Initiation threshold (string-encoded u128).
        threshold: String,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after a deposit.
    Deposited {
        /// Pool identifier.
        pool_id: PoolId,
        /// Depositor.
        participant: ParticipantId,
        /// Deposited amount.
        amount: String,
        /// Pool total after the deposit.
        pool_total: String,
        /// Timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after a pre-swap withdrawal.
    Withdrawn {
        /// Pool identifier.
        pool_id: PoolId,
        /// Withdrawer.
        participant: ParticipantId,
        /// Amount actually returned (after clamping).
        amount: String,
        /// Pool total after the withdrawal.
        pool_total: String,
        /// Timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when the pooled source asset is handed to the exchange.
    SwapInitiated {
        /// Pool identifier.
        pool_id: PoolId,
        /// Synthetic position handle.
        settlement_handle: SettlementHandle,
        /// Source amount converted.
        amount_in: String,
        /// Synthetic amount received.
        synthetic_received: String,
        /// Seconds until the position matures.
        maturity_delay_secs: u64,
        /// Timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when the matured synthetic is converted into the target asset.
    SwapFinalized {
        /// Pool identifier.
        pool_id: PoolId,
        /// Synthetic position handle.
        settlement_handle: SettlementHandle,
        /// Target amount received.
        realized_output: String,
        /// Timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a participant claims their share.
    ShareClaimed {
        /// Pool identifier.
        pool_id: PoolId,
        /// Claimant.
        participant: ParticipantId,
        /// Share paid.
        share: String,
        /// Timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl PoolEvent {
    /// Returns the pool ID associated with this event.
    #[must_use]
    pub fn pool_id(&self) -> PoolId {
        match self {
            Self::PoolCreated { pool_id, .. }
            | Self::Deposited { pool_id, .. }
            | Self::Withdrawn { pool_id, .. }
            | Self::SwapInitiated { pool_id, .. }
            | Self::SwapFinalized { pool_id, .. }
            | Self::ShareClaimed { pool_id, .. } => *pool_id,
        }
    }

    /// Returns the participant a ledger or claim event concerns; `None`
    /// for pool-wide events.
    #[must_use]
    pub fn participant(&self) -> Option<&ParticipantId> {
        match self {
            Self::Deposited { participant, .. }
            | Self::Withdrawn { participant, .. }
            | Self::ShareClaimed { participant, .. } => Some(participant),
            Self::PoolCreated { .. } | Self::SwapInitiated { .. } | Self::SwapFinalized { .. } => {
                None
            }
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::PoolCreated { .. } => "pool_created",
            Self::Deposited { .. } => "deposited",
            Self::Withdrawn { .. } => "withdrawn",
            Self::SwapInitiated { .. } => "swap_initiated",
            Self::SwapFinalized { .. } => "swap_finalized",
            Self::ShareClaimed { .. } => "share_claimed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deposited_serializes_with_tag() {
        let event = PoolEvent::Deposited {
            pool_id: PoolId::new(0),
            participant: ParticipantId::new("alice"),
            amount: "750000".to_string(),
            pool_total: "750000".to_string(),
            timestamp: Utc::now(),
        };
        let json_str = serde_json::to_string(&event).unwrap_or_default();
        assert!(json_str.contains("\"event_type\":\"deposited\""));
        assert!(json_str.contains("750000"));
        assert_eq!(event.event_type_str(), "deposited");
    }

    #[test]
    fn pool_id_accessor() {
        let event = PoolEvent::SwapFinalized {
            pool_id: PoolId::new(5),
            settlement_handle: SettlementHandle::new(1),
            realized_output: "10".to_string(),
            timestamp: Utc::now(),
        };
        assert_eq!(event.pool_id(), PoolId::new(5));
        assert_eq!(event.event_type_str(), "swap_finalized");
    }
}
