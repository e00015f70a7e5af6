//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` streams [`crate::domain::PoolEvent`]s
//! to clients filtered by pool, participant and event kind, and answers pool state
//! queries.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
