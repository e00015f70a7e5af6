//! Append-only pool storage with per-pool fine-grained locking.
//!
//! [`PoolRegistry`] stores every pool ever created in a `Vec` indexed by
//! [`PoolId`]. Each pool is individually protected by a
//! [`tokio::sync::RwLock`], so operations on different pools never contend
//! while operations on the same pool are serialized.

use std::sync::Arc;

use tokio::sync::RwLock;

use super::PoolId;
use super::pool::{Pool, PoolSummary};
use crate::error::SettlementError;

/// Central store for all settlement pools.
///
/// Pools are never removed: the registry doubles as the permanent
/// settlement record.
///
/// # Concurrency
///
/// - Multiple tasks may read the same pool concurrently.
/// - Writes to different pools are concurrent.
/// - Writes to the same pool are serialized.
#[derive(Debug, Default)]
pub struct PoolRegistry {
    pools: RwLock<Vec<Arc<RwLock<Pool>>>>,
}

impl PoolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pool built by `build` with the next sequential id.
    ///
    /// The id is assigned under the registry write lock, so concurrent
    /// creations never share an id.
    pub async fn append_with<F>(&self, build: F) -> PoolId
    where
        F: FnOnce(PoolId) -> Pool,
    {
        let mut pools = self.pools.write().await;
        let pool_id = PoolId::new(pools.len() as u64);
        pools.push(Arc::new(RwLock::new(build(pool_id))));
        pool_id
    }

    /// Returns the pool behind its per-pool lock.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::PoolNotFound`] if `pool_id` is out of range.
    pub async fn get(&self, pool_id: PoolId) -> Result<Arc<RwLock<Pool>>, SettlementError> {
        let pools = self.pools.read().await;
        pool_id
            .as_index()
            .and_then(|index| pools.get(index))
            .map(Arc::clone)
            .ok_or(SettlementError::PoolNotFound(pool_id))
    }

    /// Returns a point-in-time copy of the pool record.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::PoolNotFound`] if `pool_id` is out of range.
    pub async fn snapshot(&self, pool_id: PoolId) -> Result<Pool, SettlementError> {
        let pool_lock = self.get(pool_id).await?;
        let pool = pool_lock.read().await;
        Ok(pool.clone())
    }

    /// Returns summaries of all pools in creation order.
    pub async fn list(&self) -> Vec<PoolSummary> {
        let pools = self.pools.read().await;
        let mut summaries = Vec::with_capacity(pools.len());
        for pool_lock in pools.iter() {
            let pool = pool_lock.read().await;
            summaries.push(PoolSummary::from(&*pool));
        }
        summaries
    }

    /// Returns the number of pools ever created.
    pub async fn len(&self) -> usize {
        self.pools.read().await.len()
    }

    /// Returns `true` if no pool was created yet.
    pub async fn is_empty(&self) -> bool {
        self.pools.read().await.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::Asset;

    fn build(id: PoolId) -> Pool {
        Pool::new(
            id,
            Asset::token("DAI"),
            Asset::token("WBTC"),
            Asset::token("sBTC"),
            100,
        )
    }

    #[tokio::test]
    async fn ids_are_sequential_from_zero() {
        let registry = PoolRegistry::new();
        assert_eq!(registry.append_with(build).await, PoolId::new(0));
        assert_eq!(registry.append_with(build).await, PoolId::new(1));
        assert_eq!(registry.append_with(build).await, PoolId::new(2));
    }

    #[tokio::test]
    async fn get_returns_the_stored_pool() {
        let registry = PoolRegistry::new();
        let id = registry.append_with(build).await;

        let Ok(pool_lock) = registry.get(id).await else {
            panic!("pool not found");
        };
        let pool = pool_lock.read().await;
        assert_eq!(pool.id, id);
        assert_eq!(pool.threshold, 100);
    }

    #[tokio::test]
    async fn get_out_of_range_returns_error() {
        let registry = PoolRegistry::new();
        let result = registry.get(PoolId::new(0)).await;
        assert!(matches!(result, Err(SettlementError::PoolNotFound(_))));
    }

    #[tokio::test]
    async fn snapshot_is_detached_from_registry() {
        let registry = PoolRegistry::new();
        let id = registry.append_with(build).await;
        let Ok(mut copy) = registry.snapshot(id).await else {
            panic!("pool not found");
        };
        copy.threshold = 1;
        let Ok(again) = registry.snapshot(id).await else {
            panic!("pool not found");
        };
        assert_eq!(again.threshold, 100);
    }

    #[tokio::test]
    async fn list_and_len() {
        let registry = PoolRegistry::new();
        assert!(registry.is_empty().await);

        let _ = registry.append_with(build).await;
        let _ = registry.append_with(build).await;

        assert!(!registry.is_empty().await);
        assert_eq!(registry.len().await, 2);
        let list = registry.list().await;
        assert_eq!(list.len(), 2);
        assert!(list.iter().zip(0u64..).all(|(s, i)| s.pool_id == PoolId::new(i)));
    }
}
