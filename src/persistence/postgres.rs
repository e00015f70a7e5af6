//! PostgreSQL implementation of the persistence layer.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::models::StoredEvent;
use crate::config::SettlementConfig;
use crate::domain::{PoolEvent, PoolId};
use crate::error::SettlementError;

/// PostgreSQL-backed persistence layer using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    /// Creates a new persistence layer with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool sized from `config`.
    ///
    /// # Errors
    ///
    /// Returns a [`SettlementError::PersistenceError`] if the database is
    /// unreachable.
    pub async fn connect(config: &SettlementConfig) -> Result<Self, SettlementError> {
        tracing::info!(
            max_connections = config.database_max_connections,
            min_connections = config.database_min_connections,
            "connecting to database"
        );
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .map_err(|e| SettlementError::PersistenceError(e.to_string()))?;
        Ok(Self::new(pool))
    }

    /// Applies pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`SettlementError::PersistenceError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), SettlementError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| SettlementError::PersistenceError(e.to_string()))?;
        tracing::info!("database migrations applied");
        Ok(())
    }

    /// Appends an event to the event log.
    ///
    /// # Errors
    ///
    /// Returns a [`SettlementError::PersistenceError`] on database failure.
    pub async fn save_event(&self, event: &PoolEvent) -> Result<i64, SettlementError> {
        let pool_id = to_column(event.pool_id())?;
        let payload = serde_json::to_value(event)
            .map_err(|e| SettlementError::PersistenceError(e.to_string()))?;

        let row = sqlx::query_scalar::<_, i64>(
            "INSERT INTO settlement_events (pool_id, event_type, payload) \
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(pool_id)
        .bind(event.event_type_str())
        .bind(payload)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| SettlementError::PersistenceError(e.to_string()))?;

        Ok(row)
    }

    /// Loads events after the given timestamp, optionally filtered by pool.
    ///
    /// # Errors
    ///
    /// Returns a [`SettlementError::PersistenceError`] on database failure.
    pub async fn load_events_after(
        &self,
        after: DateTime<Utc>,
        pool_id: Option<PoolId>,
    ) -> Result<Vec<StoredEvent>, SettlementError> {
        let rows = if let Some(pid) = pool_id {
            sqlx::query_as::<_, (i64, i64, String, serde_json::Value, DateTime<Utc>)>(
                "SELECT id, pool_id, event_type, payload, created_at FROM settlement_events \
                 WHERE created_at > $1 AND pool_id = $2 ORDER BY id ASC",
            )
            .bind(after)
            .bind(to_column(pid)?)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, (i64, i64, String, serde_json::Value, DateTime<Utc>)>(
                "SELECT id, pool_id, event_type, payload, created_at FROM settlement_events \
                 WHERE created_at > $1 ORDER BY id ASC",
            )
            .bind(after)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(|e| SettlementError::PersistenceError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(
                |(id, pool_id, event_type, payload, created_at)| StoredEvent {
                    id,
                    pool_id,
                    event_type,
                    payload,
                    created_at,
                },
            )
            .collect())
    }
}

/// Postgres has no unsigned 64-bit column type.
fn to_column(pool_id: PoolId) -> Result<i64, SettlementError> {
    i64::try_from(pool_id.get()).map_err(|_| {
        SettlementError::PersistenceError(format!("pool index {pool_id} exceeds BIGINT range"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_index_maps_to_bigint() {
        assert_eq!(to_column(PoolId::new(42)), Ok(42));
        assert!(matches!(
            to_column(PoolId::new(u64::MAX)),
            Err(SettlementError::PersistenceError(_))
        ));
    }
}
