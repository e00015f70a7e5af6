//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::custody::AccountBook;
use crate::domain::EventBus;
use crate::service::SettlementService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Settlement service for all business logic.
    pub settlement: Arc<SettlementService>,
    /// Balance book backing the account endpoints.
    pub accounts: Arc<AccountBook>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
}
