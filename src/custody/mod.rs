//! Transfer primitives seam.
//!
//! The settlement core holds pooled funds in a single custody account and
//! moves value through a [`TransferAgent`]: pulling deposits in, paying
//! withdrawals and shares out, and handing the pooled source asset to the
//! exchange facility. The agent does not know about pools; per-pool custody
//! is tracked on the [`crate::domain::Pool`] record.

pub mod account_book;

use std::fmt;

use crate::domain::{Asset, ParticipantId};
use crate::error::SettlementError;

pub use account_book::AccountBook;

/// Moves value between participants, engine custody, and the exchange.
///
/// Native-currency and token legs share one interface; the [`Asset`]
/// argument selects which kind of transfer is performed.
pub trait TransferAgent: Send + Sync + fmt::Debug {
    /// Account that holds pooled funds on behalf of every pool.
    fn custody_account(&self) -> &ParticipantId;

    /// Pulls `amount` of `asset` from `from` into custody.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::InsufficientFunds`] when `from` cannot
    /// cover the transfer, or [`SettlementError::InvalidRequest`] when
    /// `from` is the custody account itself.
    fn collect(
        &self,
        asset: &Asset,
        from: &ParticipantId,
        amount: u128,
    ) -> Result<(), SettlementError>;

    /// Pays `amount` of `asset` from custody to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::InsufficientFunds`] when custody cannot
    /// cover the transfer.
    fn disburse(&self, asset: &Asset, to: &ParticipantId, amount: u128)
    -> Result<(), SettlementError>;

    /// Hands `amount` of `asset` from custody to the exchange facility.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::InsufficientFunds`] when custody cannot
    /// cover the transfer.
    fn send_to_exchange(&self, asset: &Asset, amount: u128) -> Result<(), SettlementError>;

    /// Credits custody with `amount` of `asset` delivered by the exchange.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::ArithmeticOverflow`] if the custody
    /// balance would overflow.
    fn receive_from_exchange(&self, asset: &Asset, amount: u128) -> Result<(), SettlementError>;

    /// Checks that custody could be credited with `amount` of `asset`
    /// without moving anything.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::ArithmeticOverflow`] if the custody
    /// balance would overflow.
    fn ensure_receivable(&self, asset: &Asset, amount: u128) -> Result<(), SettlementError>;
}
