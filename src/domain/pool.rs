//! Settlement pool record: lifecycle phase, contribution ledger, and share
//! arithmetic.
//!
//! A [`Pool`] never calls out to collaborators. Each operation is split into
//! a read-only check that computes what would happen and a `record_*`/`mark_*`
//! mutation that cannot fail, so the service layer can run the external
//! transfer or conversion in between and leave the record untouched when
//! that fails.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use primitive_types::U256;
use serde::Serialize;

use super::{Asset, ParticipantId, PoolId, SettlementHandle};
use crate::error::SettlementError;

/// Lifecycle phase of a pool. Only ever advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolPhase {
    /// Accepting deposits and withdrawals.
    Open,
    /// Source asset handed to the exchange; waiting for maturity.
    Initiated,
    /// Target asset received; participants may claim.
    Finalized,
}

impl PoolPhase {
    /// Returns the phase as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Initiated => "initiated",
            Self::Finalized => "finalized",
        }
    }
}

/// A single swap-settlement campaign over a fixed asset pair.
#[derive(Debug, Clone)]
pub struct Pool {
    /// Sequential identifier (immutable after creation).
    pub id: PoolId,
    /// Asset depositors contribute.
    pub source_asset: Asset,
    /// Asset participants receive after finalization.
    pub target_asset: Asset,
    /// Synthetic route resolved at creation.
    pub synthetic: Asset,
    /// Minimum aggregate contribution before initiation.
    pub threshold: u128,
    /// Sum of active contributions while open.
    pub total_contributed: u128,
    /// Current phase.
    pub phase: PoolPhase,
    /// Synthetic position, set at initiation.
    pub settlement_handle: Option<SettlementHandle>,
    /// Synthetic amount the exchange reported at initiation.
    pub synthetic_received: u128,
    /// Distribution denominator, snapshotted at initiation.
    pub contributed_at_initiation: u128,
    /// Target amount received at finalization.
    pub realized_output: u128,
    /// Amount currently held in custody for this pool.
    pub custody: u128,
    /// Sum of shares paid out so far.
    pub total_claimed: u128,
    contributions: HashMap<ParticipantId, u128>,
    claimed: HashMap<ParticipantId, bool>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last mutation.
    pub last_modified_at: DateTime<Utc>,
    /// Initiation timestamp.
    pub initiated_at: Option<DateTime<Utc>>,
    /// Finalization timestamp.
    pub finalized_at: Option<DateTime<Utc>>,
}

impl Pool {
    /// Creates an open pool with zero totals.
    #[must_use]
    pub fn new(
        id: PoolId,
        source_asset: Asset,
        target_asset: Asset,
        synthetic: Asset,
        threshold: u128,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            source_asset,
            target_asset,
            synthetic,
            threshold,
            total_contributed: 0,
            phase: PoolPhase::Open,
            settlement_handle: None,
            synthetic_received: 0,
            contributed_at_initiation: 0,
            realized_output: 0,
            custody: 0,
            total_claimed: 0,
            contributions: HashMap::new(),
            claimed: HashMap::new(),
            created_at: now,
            last_modified_at: now,
            initiated_at: None,
            finalized_at: None,
        }
    }

    /// Returns the recorded contribution of `who` (zero if none).
    #[must_use]
    pub fn contribution_of(&self, who: &ParticipantId) -> u128 {
        self.contributions.get(who).copied().unwrap_or(0)
    }

    /// Returns `true` once `who` has claimed their share.
    #[must_use]
    pub fn has_claimed(&self, who: &ParticipantId) -> bool {
        self.claimed.get(who).copied().unwrap_or(false)
    }

    /// Number of participants with a nonzero contribution.
    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.contributions.len()
    }

    /// Sum of all recorded contributions.
    #[must_use]
    pub fn sum_of_contributions(&self) -> u128 {
        self.contributions
            .values()
            .fold(0u128, |acc, c| acc.saturating_add(*c))
    }

    /// Fails with [`SettlementError::PoolNotOpen`] unless the pool is open.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::PoolNotOpen`] after initiation.
    pub fn ensure_open(&self) -> Result<(), SettlementError> {
        if self.phase == PoolPhase::Open {
            Ok(())
        } else {
            Err(SettlementError::PoolNotOpen(self.id))
        }
    }

    /// Validates a deposit of `amount` by `who` without mutating.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::PoolNotOpen`], [`SettlementError::InvalidAmount`]
    /// for zero, or [`SettlementError::ArithmeticOverflow`] if any total would
    /// overflow.
    pub fn check_deposit(&self, who: &ParticipantId, amount: u128) -> Result<(), SettlementError> {
        self.ensure_open()?;
        if amount == 0 {
            return Err(SettlementError::InvalidAmount);
        }
        self.contribution_of(who)
            .checked_add(amount)
            .and(self.total_contributed.checked_add(amount))
            .and(self.custody.checked_add(amount))
            .ok_or(SettlementError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Records a deposit previously validated by [`Self::check_deposit`].
    pub fn record_deposit(&mut self, who: &ParticipantId, amount: u128) {
        let entry = self.contributions.entry(who.clone()).or_insert(0);
        *entry = entry.saturating_add(amount);
        self.total_contributed = self.total_contributed.saturating_add(amount);
        self.custody = self.custody.saturating_add(amount);
        self.last_modified_at = Utc::now();
    }

    /// Returns how much a withdraw request of `requested` by `who` releases.
    ///
    /// Requests above the caller's balance are clamped to the full balance.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::PoolNotOpen`], [`SettlementError::InvalidAmount`]
    /// for zero, or [`SettlementError::InsufficientBalance`] when the caller
    /// holds nothing.
    pub fn check_withdrawal(
        &self,
        who: &ParticipantId,
        requested: u128,
    ) -> Result<u128, SettlementError> {
        self.ensure_open()?;
        if requested == 0 {
            return Err(SettlementError::InvalidAmount);
        }
        let balance = self.contribution_of(who);
        if balance == 0 {
            return Err(SettlementError::InsufficientBalance {
                pool_id: self.id,
                participant: who.clone(),
            });
        }
        Ok(requested.min(balance))
    }

    /// Records a withdrawal previously sized by [`Self::check_withdrawal`].
    pub fn record_withdrawal(&mut self, who: &ParticipantId, amount: u128) {
        let remaining = self.contribution_of(who).saturating_sub(amount);
        if remaining == 0 {
            self.contributions.remove(who);
        } else {
            self.contributions.insert(who.clone(), remaining);
        }
        self.total_contributed = self.total_contributed.saturating_sub(amount);
        self.custody = self.custody.saturating_sub(amount);
        self.last_modified_at = Utc::now();
    }

    /// Returns the pooled amount to hand to the exchange at initiation.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::PoolNotOpen`] or
    /// [`SettlementError::ThresholdNotReached`].
    pub fn check_initiation(&self) -> Result<u128, SettlementError> {
        self.ensure_open()?;
        if self.total_contributed < self.threshold || self.total_contributed == 0 {
            return Err(SettlementError::ThresholdNotReached {
                pool_id: self.id,
                contributed: self.total_contributed,
                threshold: self.threshold,
            });
        }
        Ok(self.total_contributed)
    }

    /// Moves the pool to [`PoolPhase::Initiated`].
    pub fn mark_initiated(&mut self, handle: SettlementHandle, synthetic_received: u128) {
        let now = Utc::now();
        self.contributed_at_initiation = self.total_contributed;
        self.settlement_handle = Some(handle);
        self.synthetic_received = synthetic_received;
        self.custody = 0;
        self.phase = PoolPhase::Initiated;
        self.initiated_at = Some(now);
        self.last_modified_at = now;
    }

    /// Returns the handle to finalize.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::SwapNotInitiated`] unless the pool is in
    /// [`PoolPhase::Initiated`].
    pub fn check_finalization(&self) -> Result<SettlementHandle, SettlementError> {
        match (self.phase, self.settlement_handle) {
            (PoolPhase::Initiated, Some(handle)) => Ok(handle),
            _ => Err(SettlementError::SwapNotInitiated(self.id)),
        }
    }

    /// Moves the pool to [`PoolPhase::Finalized`] and credits custody.
    pub fn mark_finalized(&mut self, realized_output: u128) {
        let now = Utc::now();
        self.realized_output = realized_output;
        self.custody = realized_output;
        self.phase = PoolPhase::Finalized;
        self.finalized_at = Some(now);
        self.last_modified_at = now;
    }

    /// Computes the share `who` would receive by claiming now.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::SwapNotFinalized`],
    /// [`SettlementError::NotAParticipant`], or
    /// [`SettlementError::AlreadyClaimed`].
    pub fn check_claim(&self, who: &ParticipantId) -> Result<u128, SettlementError> {
        if self.phase != PoolPhase::Finalized {
            return Err(SettlementError::SwapNotFinalized(self.id));
        }
        let contribution = self.contribution_of(who);
        if contribution == 0 {
            return Err(SettlementError::NotAParticipant {
                pool_id: self.id,
                participant: who.clone(),
            });
        }
        if self.has_claimed(who) {
            return Err(SettlementError::AlreadyClaimed {
                pool_id: self.id,
                participant: who.clone(),
            });
        }
        mul_div_floor(
            self.realized_output,
            contribution,
            self.contributed_at_initiation,
        )
    }

    /// Records a paid claim previously computed by [`Self::check_claim`].
    pub fn mark_claimed(&mut self, who: &ParticipantId, share: u128) {
        self.claimed.insert(who.clone(), true);
        self.total_claimed = self.total_claimed.saturating_add(share);
        self.custody = self.custody.saturating_sub(share);
        self.last_modified_at = Utc::now();
    }
}

/// Computes `floor(a * b / denom)` with a 256-bit intermediate product.
///
/// # Errors
///
/// Returns [`SettlementError::ArithmeticOverflow`] if `denom` is zero or the
/// quotient does not fit in `u128`.
pub fn mul_div_floor(a: u128, b: u128, denom: u128) -> Result<u128, SettlementError> {
    if denom == 0 {
        return Err(SettlementError::ArithmeticOverflow);
    }
    let product = U256::from(a)
        .checked_mul(U256::from(b))
        .ok_or(SettlementError::ArithmeticOverflow)?;
    let quotient = product / U256::from(denom);
    if quotient.bits() > 128 {
        return Err(SettlementError::ArithmeticOverflow);
    }
    Ok(quotient.low_u128())
}

/// Lightweight summary of a pool for list endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct PoolSummary {
    /// Pool identifier.
    pub pool_id: PoolId,
    /// Source asset.
    pub source_asset: Asset,
    /// Target asset.
    pub target_asset: Asset,
    /// Synthetic route.
    pub synthetic: Asset,
    /// Current phase.
    pub phase: PoolPhase,
    /// Threshold.
    pub threshold: u128,
    /// Current aggregate contribution.
    pub total_contributed: u128,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&Pool> for PoolSummary {
    fn from(pool: &Pool) -> Self {
        Self {
            pool_id: pool.id,
            source_asset: pool.source_asset.clone(),
            target_asset: pool.target_asset.clone(),
            synthetic: pool.synthetic.clone(),
            phase: pool.phase,
            threshold: pool.threshold,
            total_contributed: pool.total_contributed,
            created_at: pool.created_at,
        }
    }
}
