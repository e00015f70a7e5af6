//! Deterministic in-memory exchange facility.
//!
//! Every listed asset has exactly one synthetic and a price in a shared
//! numeraire; a synthetic is priced like the asset it tracks. Conversions
//! value `amount * price(from) / price(to)` and deduct a flat fee in basis
//! points. Maturity is measured against an internal clock that tests move
//! forward with [`SimulatedExchange::advance`].

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;

use chrono::{DateTime, TimeDelta, Utc};

use super::{SynthExchange, SyntheticPosition};
use crate::domain::pool::mul_div_floor;
use crate::domain::{Asset, SettlementHandle};
use crate::error::SettlementError;

const BPS_DENOM: u128 = 10_000;

/// One tradable asset, the synthetic that tracks it, and its price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// Listed asset.
    pub asset: Asset,
    /// Synthetic tracking the asset.
    pub synthetic: Asset,
    /// Price per base unit in the shared numeraire.
    pub price: u128,
}

impl FromStr for Listing {
    type Err = String;

    /// Parses `asset:synthetic:price`, e.g. `WBTC:sBTC:60000`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let (Some(asset), Some(synthetic), Some(price), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(format!("listing must be asset:synthetic:price, got {s:?}"));
        };
        let price: u128 = price
            .trim()
            .parse()
            .map_err(|_| format!("invalid listing price in {s:?}"))?;
        if price == 0 {
            return Err(format!("listing price must be positive in {s:?}"));
        }
        Ok(Self {
            asset: asset.parse()?,
            synthetic: synthetic.parse()?,
            price,
        })
    }
}

#[derive(Debug)]
struct ExchangeState {
    positions: HashMap<SettlementHandle, SyntheticPosition>,
    next_handle: u64,
    clock_offset: TimeDelta,
}

impl ExchangeState {
    fn new() -> Self {
        Self {
            positions: HashMap::new(),
            next_handle: 0,
            clock_offset: TimeDelta::zero(),
        }
    }
}

/// In-memory [`SynthExchange`] with a controllable clock.
#[derive(Debug)]
pub struct SimulatedExchange {
    synth_of: HashMap<Asset, Asset>,
    prices: HashMap<Asset, u128>,
    settlement_delay: TimeDelta,
    fee_bps: u32,
    state: Mutex<ExchangeState>,
}

impl SimulatedExchange {
    /// Creates an exchange with no listings.
    #[must_use]
    pub fn new(settlement_delay: TimeDelta, fee_bps: u32) -> Self {
        Self {
            synth_of: HashMap::new(),
            prices: HashMap::new(),
            settlement_delay,
            fee_bps: fee_bps.min(10_000),
            state: Mutex::new(ExchangeState::new()),
        }
    }

    /// Adds a listing. The synthetic inherits the asset's price unless it
    /// was already listed.
    #[must_use]
    pub fn with_listing(mut self, listing: Listing) -> Self {
        self.prices
            .entry(listing.synthetic.clone())
            .or_insert(listing.price);
        self.synth_of
            .insert(listing.synthetic.clone(), listing.synthetic.clone());
        self.prices.insert(listing.asset.clone(), listing.price);
        self.synth_of.insert(listing.asset, listing.synthetic);
        self
    }

    /// Adds every listing in `listings`.
    #[must_use]
    pub fn with_listings(self, listings: impl IntoIterator<Item = Listing>) -> Self {
        listings.into_iter().fold(self, Self::with_listing)
    }

    /// Moves the internal clock forward by `by`.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::Internal`] if the state lock is poisoned.
    pub fn advance(&self, by: TimeDelta) -> Result<(), SettlementError> {
        let mut state = self.lock()?;
        state.clock_offset = state.clock_offset + by;
        Ok(())
    }

    /// Returns the configured settlement delay.
    #[must_use]
    pub const fn settlement_delay(&self) -> TimeDelta {
        self.settlement_delay
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ExchangeState>, SettlementError> {
        self.state
            .lock()
            .map_err(|_| SettlementError::Internal("exchange state lock poisoned".to_string()))
    }

    fn now(state: &ExchangeState) -> DateTime<Utc> {
        Utc::now() + state.clock_offset
    }

    fn is_synthetic(&self, asset: &Asset) -> bool {
        self.synth_of.get(asset) == Some(asset)
    }

    fn value(&self, from: &Asset, to: &Asset, amount: u128) -> Result<u128, SettlementError> {
        let no_route = || SettlementError::NoRouteFound {
            source_asset: from.clone(),
            target_asset: to.clone(),
        };
        let price_from = *self.prices.get(from).ok_or_else(no_route)?;
        let price_to = *self.prices.get(to).ok_or_else(no_route)?;
        let gross = mul_div_floor(amount, price_from, price_to)?;
        let fee = mul_div_floor(gross, u128::from(self.fee_bps), BPS_DENOM)?;
        Ok(gross.saturating_sub(fee))
    }
}

impl SynthExchange for SimulatedExchange {
    fn resolve_route(&self, source: &Asset, target: &Asset) -> Option<Asset> {
        if source == target || !self.synth_of.contains_key(source) {
            return None;
        }
        self.synth_of.get(target).cloned()
    }

    fn convert_to_synthetic(
        &self,
        asset: &Asset,
        synthetic: &Asset,
        amount: u128,
        min_out: u128,
    ) -> Result<SyntheticPosition, SettlementError> {
        if !self.is_synthetic(synthetic) {
            return Err(SettlementError::NoRouteFound {
                source_asset: asset.clone(),
                target_asset: synthetic.clone(),
            });
        }
        let received = self.quote_into(asset, synthetic, amount)?;
        if received < min_out {
            return Err(SettlementError::SlippageExceeded {
                minimum: min_out,
                received,
            });
        }

        let mut state = self.lock()?;
        state.next_handle = state.next_handle.saturating_add(1);
        let handle = SettlementHandle::new(state.next_handle);
        let position = SyntheticPosition {
            handle,
            synthetic: synthetic.clone(),
            balance: received,
            maturity_delay_secs: u64::try_from(self.settlement_delay.num_seconds()).unwrap_or(0),
            matures_at: Self::now(&state) + self.settlement_delay,
            redeemed: false,
        };
        state.positions.insert(handle, position.clone());
        tracing::debug!(%handle, %asset, %synthetic, amount, received, "synthetic position opened");
        Ok(position)
    }

    fn is_matured(&self, handle: SettlementHandle) -> Result<bool, SettlementError> {
        let state = self.lock()?;
        let position = state
            .positions
            .get(&handle)
            .ok_or(SettlementError::UnknownHandle(handle))?;
        Ok(Self::now(&state) >= position.matures_at)
    }

    fn convert_from_synthetic(
        &self,
        handle: SettlementHandle,
        target: &Asset,
        min_out: u128,
    ) -> Result<u128, SettlementError> {
        let mut state = self.lock()?;
        let now = Self::now(&state);
        let position = state
            .positions
            .get(&handle)
            .filter(|p| !p.redeemed)
            .ok_or(SettlementError::UnknownHandle(handle))?;
        if now < position.matures_at {
            return Err(SettlementError::NotYetMatured(handle));
        }
        let received = self.value(&position.synthetic, target, position.balance)?;
        if received < min_out {
            return Err(SettlementError::SlippageExceeded {
                minimum: min_out,
                received,
            });
        }
        if let Some(position) = state.positions.get_mut(&handle) {
            position.redeemed = true;
        }
        tracing::debug!(%handle, %target, received, "synthetic position redeemed");
        Ok(received)
    }

    fn quote_into(
        &self,
        asset: &Asset,
        synthetic: &Asset,
        amount: u128,
    ) -> Result<u128, SettlementError> {
        self.value(asset, synthetic, amount)
    }

    fn quote_from(
        &self,
        synthetic: &Asset,
        asset: &Asset,
        amount: u128,
    ) -> Result<u128, SettlementError> {
        self.value(synthetic, asset, amount)
    }

    fn position(&self, handle: SettlementHandle) -> Option<SyntheticPosition> {
        self.lock()
            .ok()
            .and_then(|state| state.positions.get(&handle).cloned())
    }
}
