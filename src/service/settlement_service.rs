//! Settlement service: orchestrates pool operations and emits events.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::custody::TransferAgent;
use crate::domain::{
    Asset, EventBus, ParticipantId, Pool, PoolEvent, PoolId, PoolPhase, PoolRegistry,
    PoolSummary, SettlementHandle,
};
use crate::error::SettlementError;
use crate::exchange::{SynthExchange, SyntheticPosition};

/// Contribution and claim state of one participant in one pool.
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantStatus {
    /// Pool identifier.
    pub pool_id: PoolId,
    /// The participant.
    pub participant: ParticipantId,
    /// Recorded contribution (share numerator).
    pub contribution: u128,
    /// Whether the post-swap share was already claimed.
    pub claimed: bool,
    /// Share a claim would pay right now (zero if not claimable).
    pub claimable: u128,
}

/// Expected outcome of both swap legs at current exchange rates.
#[derive(Debug, Clone, Serialize)]
pub struct SwapQuote {
    /// Pool identifier.
    pub pool_id: PoolId,
    /// Current phase.
    pub phase: PoolPhase,
    /// Source amount the first leg converts (or converted).
    pub source_amount: u128,
    /// Synthetic expected (or held) after the first leg.
    pub expected_synthetic: u128,
    /// Target expected from the second leg.
    pub expected_target: u128,
    /// Synthetic position, once initiated.
    pub settlement_handle: Option<SettlementHandle>,
    /// Whether the synthetic position has matured.
    pub matured: bool,
}

/// Ledger state produced by a deposit or withdrawal, read under the same
/// write lock that applied it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerReceipt {
    /// Amount actually moved.
    pub amount: u128,
    /// Caller's contribution afterwards.
    pub contribution: u128,
    /// Pool total afterwards.
    pub pool_total: u128,
}

/// Outcome of the first swap leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Initiation {
    /// Source amount handed to the exchange.
    pub amount_in: u128,
    /// Synthetic position opened for the pool.
    pub position: SyntheticPosition,
}

/// Target-asset amount credited by finalize or paid by claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Payout {
    /// Asset paid.
    pub asset: Asset,
    /// Amount paid.
    pub amount: u128,
}

/// Orchestration layer for all settlement operations.
///
/// Stateless coordinator: owns references to the [`PoolRegistry`] for state,
/// the exchange and transfer collaborators, and the [`EventBus`]. Every
/// mutation follows the pattern: acquire the pool write lock → validate all
/// guards → call collaborators → mutate the record → emit events. A failure
/// before the mutation step returns with the record untouched.
#[derive(Debug, Clone)]
pub struct SettlementService {
    registry: Arc<PoolRegistry>,
    exchange: Arc<dyn SynthExchange>,
    transfers: Arc<dyn TransferAgent>,
    event_bus: EventBus,
    operator: ParticipantId,
}

impl SettlementService {
    /// Creates a new `SettlementService`.
    #[must_use]
    pub fn new(
        registry: Arc<PoolRegistry>,
        exchange: Arc<dyn SynthExchange>,
        transfers: Arc<dyn TransferAgent>,
        event_bus: EventBus,
        operator: ParticipantId,
    ) -> Self {
        Self {
            registry,
            exchange,
            transfers,
            event_bus,
            operator,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns a reference to the inner [`PoolRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<PoolRegistry> {
        &self.registry
    }

    /// Returns the configured operator identity.
    #[must_use]
    pub fn operator(&self) -> &ParticipantId {
        &self.operator
    }

    /// Fails unless `caller` is the configured operator.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::Unauthorized`] for anyone else.
    pub fn ensure_operator(&self, caller: &ParticipantId) -> Result<(), SettlementError> {
        if *caller == self.operator {
            Ok(())
        } else {
            Err(SettlementError::Unauthorized(caller.clone()))
        }
    }

    /// Rejects the custody account acting as a participant: its transfers
    /// would move nothing while still being recorded as contributions.
    fn ensure_external(&self, caller: &ParticipantId) -> Result<(), SettlementError> {
        if caller == self.transfers.custody_account() {
            Err(SettlementError::Unauthorized(caller.clone()))
        } else {
            Ok(())
        }
    }

    // ── Pool Registry ───────────────────────────────────────────────────

    /// Creates a new open pool over `source` → `target`.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::Unauthorized`] for non-operators,
    /// [`SettlementError::InvalidAmount`] for a zero threshold,
    /// [`SettlementError::InvalidRequest`] for identical legs, or
    /// [`SettlementError::NoRouteFound`] if the exchange cannot bridge them.
    pub async fn create_pool(
        &self,
        caller: &ParticipantId,
        source: Asset,
        target: Asset,
        threshold: u128,
    ) -> Result<PoolId, SettlementError> {
        self.ensure_operator(caller)?;
        if threshold == 0 {
            return Err(SettlementError::InvalidAmount);
        }
        if source == target {
            return Err(SettlementError::InvalidRequest(
                "source and target assets must differ".to_string(),
            ));
        }
        let synthetic = self.exchange.resolve_route(&source, &target).ok_or_else(|| {
            SettlementError::NoRouteFound {
                source_asset: source.clone(),
                target_asset: target.clone(),
            }
        })?;

        let pool_id = self
            .registry
            .append_with(|id| {
                Pool::new(
                    id,
                    source.clone(),
                    target.clone(),
                    synthetic.clone(),
                    threshold,
                )
            })
            .await;

        let _ = self.event_bus.publish(PoolEvent::PoolCreated {
            pool_id,
            source_asset: source.clone(),
            target_asset: target.clone(),
            synthetic: synthetic.clone(),
            threshold: threshold.to_string(),
            timestamp: Utc::now(),
        });

        tracing::info!(%pool_id, %source, %target, %synthetic, threshold, "pool created");
        Ok(pool_id)
    }

    /// Returns a copy of the pool record.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::PoolNotFound`] for an unknown id.
    pub async fn get_pool(&self, pool_id: PoolId) -> Result<Pool, SettlementError> {
        self.registry.snapshot(pool_id).await
    }

    /// Returns the number of pools ever created.
    pub async fn pool_count(&self) -> usize {
        self.registry.len().await
    }

    /// Returns summaries of all pools in creation order.
    pub async fn list_pools(&self) -> Vec<PoolSummary> {
        self.registry.list().await
    }

    // ── Deposit Ledger ──────────────────────────────────────────────────

    /// Returns the pool's current aggregate contribution.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::PoolNotFound`] for an unknown id.
    pub async fn pool_amount(&self, pool_id: PoolId) -> Result<u128, SettlementError> {
        let pool_lock = self.registry.get(pool_id).await?;
        let pool = pool_lock.read().await;
        Ok(pool.total_contributed)
    }

    /// Returns the recorded contribution of `who`.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::PoolNotFound`] for an unknown id.
    pub async fn contribution_of(
        &self,
        pool_id: PoolId,
        who: &ParticipantId,
    ) -> Result<u128, SettlementError> {
        let pool_lock = self.registry.get(pool_id).await?;
        let pool = pool_lock.read().await;
        Ok(pool.contribution_of(who))
    }

    /// Returns contribution, claim flag and claimable share of `who`.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::PoolNotFound`] for an unknown id.
    pub async fn participant_status(
        &self,
        pool_id: PoolId,
        who: &ParticipantId,
    ) -> Result<ParticipantStatus, SettlementError> {
        let pool_lock = self.registry.get(pool_id).await?;
        let pool = pool_lock.read().await;
        Ok(ParticipantStatus {
            pool_id,
            participant: who.clone(),
            contribution: pool.contribution_of(who),
            claimed: pool.has_claimed(who),
            claimable: pool.check_claim(who).unwrap_or(0),
        })
    }

    /// Deposits `amount` of the pool's source asset on behalf of `caller`.
    ///
    /// `attached_value` is the native currency sent along with the call: it
    /// must equal `amount` when the source asset is native and be zero
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::Unauthorized`] for the custody account,
    /// [`SettlementError::PoolNotFound`], [`SettlementError::PoolNotOpen`],
    /// [`SettlementError::InvalidAmount`], [`SettlementError::ValueMismatch`],
    /// or the transfer agent's error when the caller cannot fund it.
    pub async fn deposit(
        &self,
        pool_id: PoolId,
        caller: &ParticipantId,
        amount: u128,
        attached_value: u128,
    ) -> Result<LedgerReceipt, SettlementError> {
        self.ensure_external(caller)?;
        let pool_lock = self.registry.get(pool_id).await?;
        let mut pool = pool_lock.write().await;

        pool.check_deposit(caller, amount)?;
        let expected = if pool.source_asset.is_native() {
            amount
        } else {
            0
        };
        if attached_value != expected {
            return Err(SettlementError::ValueMismatch {
                expected,
                attached: attached_value,
            });
        }

        self.transfers.collect(&pool.source_asset, caller, amount)?;
        pool.record_deposit(caller, amount);

        let contribution = pool.contribution_of(caller);
        let pool_total = pool.total_contributed;
        drop(pool);

        let _ = self.event_bus.publish(PoolEvent::Deposited {
            pool_id,
            participant: caller.clone(),
            amount: amount.to_string(),
            pool_total: pool_total.to_string(),
            timestamp: Utc::now(),
        });

        tracing::debug!(%pool_id, participant = %caller, amount, pool_total, "deposit recorded");
        Ok(LedgerReceipt {
            amount,
            contribution,
            pool_total,
        })
    }

    /// Withdraws up to `amount` of the caller's contribution while the pool
    /// is open. Requests above the caller's balance release the full
    /// balance. The receipt carries the amount actually withdrawn.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::Unauthorized`] for the custody account,
    /// [`SettlementError::PoolNotFound`], [`SettlementError::PoolNotOpen`],
    /// [`SettlementError::InvalidAmount`], or
    /// [`SettlementError::InsufficientBalance`] when the caller holds nothing.
    pub async fn withdraw(
        &self,
        pool_id: PoolId,
        caller: &ParticipantId,
        amount: u128,
    ) -> Result<LedgerReceipt, SettlementError> {
        self.ensure_external(caller)?;
        let pool_lock = self.registry.get(pool_id).await?;
        let mut pool = pool_lock.write().await;

        let released = pool.check_withdrawal(caller, amount)?;
        self.transfers
            .disburse(&pool.source_asset, caller, released)?;
        pool.record_withdrawal(caller, released);

        let contribution = pool.contribution_of(caller);
        let pool_total = pool.total_contributed;
        drop(pool);

        let _ = self.event_bus.publish(PoolEvent::Withdrawn {
            pool_id,
            participant: caller.clone(),
            amount: released.to_string(),
            pool_total: pool_total.to_string(),
            timestamp: Utc::now(),
        });

        if released < amount {
            tracing::debug!(%pool_id, participant = %caller, requested = amount, released, "withdraw clamped to balance");
        }
        tracing::debug!(%pool_id, participant = %caller, released, pool_total, "withdrawal recorded");
        Ok(LedgerReceipt {
            amount: released,
            contribution,
            pool_total,
        })
    }

    // ── Swap Orchestrator ───────────────────────────────────────────────

    /// Hands the pooled source asset to the exchange for conversion into
    /// the pool's synthetic. Operator only.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::Unauthorized`], [`SettlementError::PoolNotFound`],
    /// [`SettlementError::PoolNotOpen`], [`SettlementError::ThresholdNotReached`],
    /// or [`SettlementError::SlippageExceeded`] when the exchange would
    /// deliver less than `minimum_synthetic_out`.
    pub async fn initiate(
        &self,
        pool_id: PoolId,
        caller: &ParticipantId,
        minimum_synthetic_out: u128,
    ) -> Result<Initiation, SettlementError> {
        self.ensure_operator(caller)?;
        let pool_lock = self.registry.get(pool_id).await?;
        let mut pool = pool_lock.write().await;

        let amount_in = pool.check_initiation()?;
        self.transfers.send_to_exchange(&pool.source_asset, amount_in)?;
        let position = match self.exchange.convert_to_synthetic(
            &pool.source_asset,
            &pool.synthetic,
            amount_in,
            minimum_synthetic_out,
        ) {
            Ok(position) => position,
            Err(err) => {
                if let Err(refund_err) = self
                    .transfers
                    .receive_from_exchange(&pool.source_asset, amount_in)
                {
                    tracing::error!(%pool_id, error = %refund_err, "failed to restore custody after rejected conversion");
                }
                return Err(err);
            }
        };
        pool.mark_initiated(position.handle, position.balance);
        drop(pool);

        let _ = self.event_bus.publish(PoolEvent::SwapInitiated {
            pool_id,
            settlement_handle: position.handle,
            amount_in: amount_in.to_string(),
            synthetic_received: position.balance.to_string(),
            maturity_delay_secs: position.maturity_delay_secs,
            timestamp: Utc::now(),
        });

        tracing::info!(
            %pool_id,
            handle = %position.handle,
            amount_in,
            synthetic_received = position.balance,
            matures_at = %position.matures_at,
            "pool swap initiated"
        );
        Ok(Initiation {
            amount_in,
            position,
        })
    }

    /// Redeems the matured synthetic into the target asset. Callable by
    /// anyone. The payout carries the realized output.
    ///
    /// Custody must be able to absorb the quoted redemption before the
    /// position is spent, otherwise the pool would be left initiated with
    /// nothing to redeem.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::PoolNotFound`], [`SettlementError::SwapNotInitiated`],
    /// [`SettlementError::NotYetMatured`], [`SettlementError::ArithmeticOverflow`]
    /// when custody cannot hold the output, or [`SettlementError::SlippageExceeded`]
    /// when the exchange would deliver less than `minimum_target_out`.
    pub async fn finalize(
        &self,
        pool_id: PoolId,
        minimum_target_out: u128,
    ) -> Result<Payout, SettlementError> {
        let pool_lock = self.registry.get(pool_id).await?;
        let mut pool = pool_lock.write().await;

        let handle = pool.check_finalization()?;
        if !self.exchange.is_matured(handle)? {
            return Err(SettlementError::NotYetMatured(handle));
        }
        let quoted = self.exchange.quote_from(
            &pool.synthetic,
            &pool.target_asset,
            pool.synthetic_received,
        )?;
        self.transfers.ensure_receivable(&pool.target_asset, quoted)?;
        let realized =
            self.exchange
                .convert_from_synthetic(handle, &pool.target_asset, minimum_target_out)?;
        self.transfers
            .receive_from_exchange(&pool.target_asset, realized)?;
        pool.mark_finalized(realized);
        let asset = pool.target_asset.clone();
        drop(pool);

        let _ = self.event_bus.publish(PoolEvent::SwapFinalized {
            pool_id,
            settlement_handle: handle,
            realized_output: realized.to_string(),
            timestamp: Utc::now(),
        });

        tracing::info!(%pool_id, %handle, realized, "pool swap finalized");
        Ok(Payout {
            asset,
            amount: realized,
        })
    }

    /// Quotes both legs at current exchange rates.
    ///
    /// Before initiation the first leg is quoted for the current pool
    /// total; afterwards the recorded synthetic amount is used.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::PoolNotFound`] or the exchange's quoting
    /// error.
    pub async fn quote(&self, pool_id: PoolId) -> Result<SwapQuote, SettlementError> {
        let pool = self.registry.snapshot(pool_id).await?;
        let (source_amount, expected_synthetic) = match pool.phase {
            PoolPhase::Open => (
                pool.total_contributed,
                self.exchange.quote_into(
                    &pool.source_asset,
                    &pool.synthetic,
                    pool.total_contributed,
                )?,
            ),
            PoolPhase::Initiated | PoolPhase::Finalized => {
                (pool.contributed_at_initiation, pool.synthetic_received)
            }
        };
        let expected_target = match pool.phase {
            PoolPhase::Finalized => pool.realized_output,
            PoolPhase::Open | PoolPhase::Initiated => self.exchange.quote_from(
                &pool.synthetic,
                &pool.target_asset,
                expected_synthetic,
            )?,
        };
        let matured = match pool.settlement_handle {
            Some(handle) => self.exchange.is_matured(handle)?,
            None => false,
        };
        Ok(SwapQuote {
            pool_id,
            phase: pool.phase,
            source_amount,
            expected_synthetic,
            expected_target,
            settlement_handle: pool.settlement_handle,
            matured,
        })
    }

    // ── Distribution Engine ─────────────────────────────────────────────

    /// Returns the share `who` would receive by claiming now.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::PoolNotFound`] or the reason a claim would
    /// be rejected.
    pub async fn claimable(
        &self,
        pool_id: PoolId,
        who: &ParticipantId,
    ) -> Result<u128, SettlementError> {
        let pool_lock = self.registry.get(pool_id).await?;
        let pool = pool_lock.read().await;
        pool.check_claim(who)
    }

    /// Pays the caller's proportional share of the realized output.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::Unauthorized`] for the custody account,
    /// [`SettlementError::PoolNotFound`], [`SettlementError::SwapNotFinalized`],
    /// [`SettlementError::NotAParticipant`], or [`SettlementError::AlreadyClaimed`].
    pub async fn claim(
        &self,
        pool_id: PoolId,
        caller: &ParticipantId,
    ) -> Result<Payout, SettlementError> {
        self.ensure_external(caller)?;
        let pool_lock = self.registry.get(pool_id).await?;
        let mut pool = pool_lock.write().await;

        let share = pool.check_claim(caller)?;
        self.transfers.disburse(&pool.target_asset, caller, share)?;
        pool.mark_claimed(caller, share);
        let dust = pool.custody;
        let asset = pool.target_asset.clone();
        drop(pool);

        let _ = self.event_bus.publish(PoolEvent::ShareClaimed {
            pool_id,
            participant: caller.clone(),
            share: share.to_string(),
            timestamp: Utc::now(),
        });

        tracing::info!(%pool_id, participant = %caller, share, remaining_custody = dust, "share claimed");
        Ok(Payout {
            asset,
            amount: share,
        })
    }
}
