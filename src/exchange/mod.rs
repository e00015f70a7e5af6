//! Exchange facility seam: routes, conversions, and maturity.
//!
//! The settlement core never prices anything itself. It asks a
//! [`SynthExchange`] which synthetic bridges a pair, hands it the pooled
//! source amount, and later redeems the matured synthetic into the target
//! asset. [`SimulatedExchange`] is the deterministic in-memory
//! implementation used by the server binary and the tests.

pub mod simulated;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{Asset, SettlementHandle};
use crate::error::SettlementError;

pub use simulated::{Listing, SimulatedExchange};

/// A synthetic position opened by [`SynthExchange::convert_to_synthetic`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntheticPosition {
    /// Handle identifying the position.
    pub handle: SettlementHandle,
    /// Synthetic asset held.
    pub synthetic: Asset,
    /// Synthetic amount held.
    pub balance: u128,
    /// Settlement delay imposed at opening, in seconds.
    pub maturity_delay_secs: u64,
    /// Instant after which the position may be redeemed.
    pub matures_at: DateTime<Utc>,
    /// Whether the position was already redeemed.
    pub redeemed: bool,
}

/// External exchange facility.
///
/// Each call is synchronous and atomic: it either completes and returns its
/// value, or fails and changes nothing on the facility side.
pub trait SynthExchange: Send + Sync + fmt::Debug {
    /// Returns the synthetic bridging `source` to `target`, or `None` when
    /// the pair is not swappable.
    fn resolve_route(&self, source: &Asset, target: &Asset) -> Option<Asset>;

    /// Converts `amount` of `asset` into `synthetic`.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::SlippageExceeded`] when the conversion
    /// would yield less than `min_out`, or [`SettlementError::NoRouteFound`]
    /// for unlisted assets.
    fn convert_to_synthetic(
        &self,
        asset: &Asset,
        synthetic: &Asset,
        amount: u128,
        min_out: u128,
    ) -> Result<SyntheticPosition, SettlementError>;

    /// Returns `true` once the settlement delay of `handle` has elapsed.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::UnknownHandle`] for unknown handles.
    fn is_matured(&self, handle: SettlementHandle) -> Result<bool, SettlementError>;

    /// Redeems the full synthetic balance behind `handle` into `target`.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::NotYetMatured`] before maturity,
    /// [`SettlementError::UnknownHandle`] for unknown or redeemed handles, or
    /// [`SettlementError::SlippageExceeded`] below `min_out`.
    fn convert_from_synthetic(
        &self,
        handle: SettlementHandle,
        target: &Asset,
        min_out: u128,
    ) -> Result<u128, SettlementError>;

    /// Quotes how much `synthetic` `amount` of `asset` would buy.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::NoRouteFound`] for unlisted assets.
    fn quote_into(
        &self,
        asset: &Asset,
        synthetic: &Asset,
        amount: u128,
    ) -> Result<u128, SettlementError>;

    /// Quotes how much `asset` `amount` of `synthetic` would buy.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::NoRouteFound`] for unlisted assets.
    fn quote_from(
        &self,
        synthetic: &Asset,
        asset: &Asset,
        amount: u128,
    ) -> Result<u128, SettlementError>;

    /// Returns the position behind `handle`, if any.
    fn position(&self, handle: SettlementHandle) -> Option<SyntheticPosition>;
}
