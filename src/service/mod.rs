//! Service layer: business logic orchestration.
//!
//! [`SettlementService`] coordinates pool operations, delegates conversions
//! to the [`crate::exchange::SynthExchange`] and value movement to the
//! [`crate::custody::TransferAgent`], and emits events through the
//! [`super::domain::EventBus`].

pub mod settlement_service;

pub use settlement_service::{
    Initiation, LedgerReceipt, ParticipantStatus, Payout, SettlementService, SwapQuote,
};
