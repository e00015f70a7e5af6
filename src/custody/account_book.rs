//! In-memory balance book implementing [`TransferAgent`].

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::TransferAgent;
use crate::domain::{Asset, ParticipantId};
use crate::error::SettlementError;

type Balances = HashMap<(ParticipantId, Asset), u128>;

/// Per-(account, asset) balances with a dedicated custody account.
///
/// Stands in for token contracts and native-currency accounting. Every
/// transfer checks the debit side before touching either balance, so a
/// failed transfer changes nothing.
#[derive(Debug)]
pub struct AccountBook {
    custody: ParticipantId,
    balances: Mutex<Balances>,
}

impl AccountBook {
    /// Creates an empty book whose custody account is `custody`.
    #[must_use]
    pub fn new(custody: ParticipantId) -> Self {
        Self {
            custody,
            balances: Mutex::new(HashMap::new()),
        }
    }

    /// Adds `amount` of `asset` to `account` out of thin air.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::ArithmeticOverflow`] on overflow or
    /// [`SettlementError::Internal`] if the book lock is poisoned.
    pub fn credit(
        &self,
        account: &ParticipantId,
        asset: &Asset,
        amount: u128,
    ) -> Result<u128, SettlementError> {
        let mut balances = self.lock()?;
        Self::add(&mut balances, account, asset, amount)
    }

    /// Returns the balance of `asset` held by `account`.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::Internal`] if the book lock is poisoned.
    pub fn balance_of(&self, account: &ParticipantId, asset: &Asset) -> Result<u128, SettlementError> {
        let balances = self.lock()?;
        Ok(Self::get(&balances, account, asset))
    }

    /// Returns the custody balance of `asset`.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::Internal`] if the book lock is poisoned.
    pub fn custody_balance(&self, asset: &Asset) -> Result<u128, SettlementError> {
        self.balance_of(&self.custody, asset)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Balances>, SettlementError> {
        self.balances
            .lock()
            .map_err(|_| SettlementError::Internal("account book lock poisoned".to_string()))
    }

    fn get(balances: &Balances, account: &ParticipantId, asset: &Asset) -> u128 {
        balances
            .get(&(account.clone(), asset.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn add(
        balances: &mut Balances,
        account: &ParticipantId,
        asset: &Asset,
        amount: u128,
    ) -> Result<u128, SettlementError> {
        let entry = balances.entry((account.clone(), asset.clone())).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or(SettlementError::ArithmeticOverflow)?;
        Ok(*entry)
    }

    fn debit(
        balances: &mut Balances,
        account: &ParticipantId,
        asset: &Asset,
        amount: u128,
    ) -> Result<(), SettlementError> {
        let available = Self::get(balances, account, asset);
        let remaining =
            available
                .checked_sub(amount)
                .ok_or_else(|| SettlementError::InsufficientFunds {
                    account: account.clone(),
                    asset: asset.clone(),
                    needed: amount,
                    available,
                })?;
        balances.insert((account.clone(), asset.clone()), remaining);
        Ok(())
    }

    fn transfer(
        &self,
        asset: &Asset,
        from: &ParticipantId,
        to: &ParticipantId,
        amount: u128,
    ) -> Result<(), SettlementError> {
        if from == to {
            return Err(SettlementError::InvalidRequest(format!(
                "{from} cannot transfer to itself"
            )));
        }
        let mut balances = self.lock()?;
        if Self::get(&balances, to, asset).checked_add(amount).is_none() {
            return Err(SettlementError::ArithmeticOverflow);
        }
        Self::debit(&mut balances, from, asset, amount)?;
        Self::add(&mut balances, to, asset, amount)?;
        tracing::debug!(%asset, %from, %to, amount, "transfer");
        Ok(())
    }
}

impl TransferAgent for AccountBook {
    fn custody_account(&self) -> &ParticipantId {
        &self.custody
    }

    fn collect(
        &self,
        asset: &Asset,
        from: &ParticipantId,
        amount: u128,
    ) -> Result<(), SettlementError> {
        self.transfer(asset, from, &self.custody, amount)
    }

    fn disburse(
        &self,
        asset: &Asset,
        to: &ParticipantId,
        amount: u128,
    ) -> Result<(), SettlementError> {
        self.transfer(asset, &self.custody, to, amount)
    }

    fn send_to_exchange(&self, asset: &Asset, amount: u128) -> Result<(), SettlementError> {
        let mut balances = self.lock()?;
        Self::debit(&mut balances, &self.custody, asset, amount)
    }

    fn receive_from_exchange(&self, asset: &Asset, amount: u128) -> Result<(), SettlementError> {
        let mut balances = self.lock()?;
        Self::add(&mut balances, &self.custody, asset, amount).map(|_| ())
    }

    fn ensure_receivable(&self, asset: &Asset, amount: u128) -> Result<(), SettlementError> {
        let balances = self.lock()?;
        Self::get(&balances, &self.custody, asset)
            .checked_add(amount)
            .map(|_| ())
            .ok_or(SettlementError::ArithmeticOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> AccountBook {
        AccountBook::new(ParticipantId::new("custody"))
    }

    #[test]
    fn collect_moves_funds_into_custody() {
        let book = book();
        let alice = ParticipantId::new("alice");
        let dai = Asset::token("DAI");
        assert_eq!(book.credit(&alice, &dai, 100), Ok(100));

        assert!(book.collect(&dai, &alice, 60).is_ok());
        assert_eq!(book.balance_of(&alice, &dai), Ok(40));
        assert_eq!(book.custody_balance(&dai), Ok(60));
    }

    #[test]
    fn failed_collect_changes_nothing() {
        let book = book();
        let alice = ParticipantId::new("alice");
        let _ = book.credit(&alice, &Asset::Native, 5);

        let result = book.collect(&Asset::Native, &alice, 6);
        assert!(matches!(
            result,
            Err(SettlementError::InsufficientFunds {
                needed: 6,
                available: 5,
                ..
            })
        ));
        assert_eq!(book.balance_of(&alice, &Asset::Native), Ok(5));
        assert_eq!(book.custody_balance(&Asset::Native), Ok(0));
    }

    #[test]
    fn exchange_legs_adjust_custody_only() {
        let book = book();
        let bob = ParticipantId::new("bob");
        let dai = Asset::token("DAI");
        let _ = book.credit(&bob, &dai, 10);
        let _ = book.collect(&dai, &bob, 10);

        assert!(book.send_to_exchange(&dai, 10).is_ok());
        assert_eq!(book.custody_balance(&dai), Ok(0));
        assert!(book.send_to_exchange(&dai, 1).is_err());

        assert!(book.receive_from_exchange(&Asset::Native, 7).is_ok());
        assert!(book.disburse(&Asset::Native, &bob, 7).is_ok());
        assert_eq!(book.balance_of(&bob, &Asset::Native), Ok(7));
    }

    #[test]
    fn custody_cannot_pay_itself() {
        let book = book();
        let custody = book.custody_account().clone();
        let dai = Asset::token("DAI");
        let _ = book.credit(&custody, &dai, 1_000);

        assert!(matches!(
            book.collect(&dai, &custody, 1_000),
            Err(SettlementError::InvalidRequest(_))
        ));
        assert!(matches!(
            book.disburse(&dai, &custody, 1_000),
            Err(SettlementError::InvalidRequest(_))
        ));
        assert_eq!(book.custody_balance(&dai), Ok(1_000));
    }

    #[test]
    fn receivable_check_detects_overflow() {
        let book = book();
        let wbtc = Asset::token("WBTC");
        assert!(book.ensure_receivable(&wbtc, u128::MAX).is_ok());
        let _ = book.receive_from_exchange(&wbtc, 2);
        assert_eq!(
            book.ensure_receivable(&wbtc, u128::MAX - 1),
            Err(SettlementError::ArithmeticOverflow)
        );
        assert!(book.ensure_receivable(&wbtc, u128::MAX - 2).is_ok());
        assert_eq!(book.custody_balance(&wbtc), Ok(2));
    }
}
