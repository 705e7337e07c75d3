use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use rust_decimal::Decimal;
use thiserror::Error;

pub type AccountId = u32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    #[error("Initial balance {balance} must not be negative")]
    NegativeInitialBalance { balance: Decimal },
    #[error("Insufficient funds on account {account}: available {available}, requested {requested}")]
    InsufficientFunds {
        account: AccountId,
        available: Decimal,
        requested: Decimal,
    },
}

/// A single account. The balance lives behind the account's own lock and can
/// only change while a [`BalanceGuard`] for it is alive.
#[derive(Debug)]
pub struct Account {
    id: AccountId,
    balance: Mutex<Decimal>,
}

impl Account {
    pub fn new(id: AccountId, initial_balance: Decimal) -> Result<Self, AccountError> {
        if initial_balance < Decimal::ZERO {
            return Err(AccountError::NegativeInitialBalance {
                balance: initial_balance,
            });
        }
        Ok(Self {
            id,
            balance: Mutex::new(initial_balance),
        })
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    /// Reads the balance under the account lock.
    pub fn balance(&self) -> Decimal {
        *self.balance.lock()
    }

    /// Waits up to `timeout` for the account lock.
    pub(crate) fn try_lock_for(&self, timeout: Duration) -> Option<BalanceGuard<'_>> {
        self.balance
            .try_lock_for(timeout)
            .map(|balance| BalanceGuard {
                account: self.id,
                balance,
            })
    }
}

/// Exclusive access to one account balance. Dropping it releases the lock.
pub(crate) struct BalanceGuard<'a> {
    account: AccountId,
    balance: MutexGuard<'a, Decimal>,
}

impl BalanceGuard<'_> {
    pub(crate) fn account(&self) -> AccountId {
        self.account
    }

    /// Moves `amount` from this account to `other`. Both locks are held by
    /// construction, so the check and the two updates form one critical section.
    pub(crate) fn debit_then_credit(
        &mut self,
        other: &mut BalanceGuard<'_>,
        amount: Decimal,
    ) -> Result<(), AccountError> {
        if *self.balance < amount {
            return Err(AccountError::InsufficientFunds {
                account: self.account,
                available: *self.balance,
                requested: amount,
            });
        }
        *self.balance -= amount;
        *other.balance += amount;
        Ok(())
    }
}
