//! Domain layer: identifiers, the pool record, the registry, and events.
//!
//! This module holds the settlement state machine and ledger arithmetic.
//! Nothing here talks to the exchange or moves funds; that orchestration
//! lives in [`crate::service`].

pub mod asset;
pub mod event_bus;
pub mod pool;
pub mod pool_event;
pub mod pool_id;
pub mod pool_registry;

pub use asset::{Asset, NATIVE_SENTINEL, ParticipantId, SettlementHandle};
pub use event_bus::EventBus;
pub use pool::{Pool, PoolPhase, PoolSummary};
pub use pool_event::PoolEvent;
pub use pool_id::PoolId;
pub use pool_registry::PoolRegistry;
