//! # synth-pool-settlement
//!
//! Pooled swap settlement engine routed through a synthetic-asset exchange.
//!
//! Participants deposit a source asset into a pool. Once the pool reaches
//! its threshold, the operator converts the pooled amount into a synthetic
//! asset; after the exchange's settlement delay anyone finalizes the pool by
//! redeeming the synthetic into the target asset, and each participant
//! claims `floor(realized * contribution / total)` of it.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── SettlementService (service/)
//!     ├── EventBus (domain/) ──► event recorder (persistence/)
//!     │
//!     ├── PoolRegistry + Pool (domain/)
//!     ├── SynthExchange (exchange/)
//!     └── TransferAgent (custody/)
//! ```

pub mod api;
pub mod app;
pub mod app_state;
pub mod config;
pub mod custody;
pub mod domain;
pub mod error;
pub mod exchange;
pub mod persistence;
pub mod service;
pub mod ws;
