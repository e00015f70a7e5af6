//! Persistence layer: PostgreSQL event log.
//!
//! Every [`crate::domain::PoolEvent`] published on the bus is appended to
//! the `settlement_events` table by a background recorder task. The log is
//! append-only and never pruned.

pub mod models;
pub mod postgres;
pub mod recorder;

pub use postgres::PostgresPersistence;
pub use recorder::spawn_event_recorder;
