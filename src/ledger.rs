use std::sync::Arc;

use chrono::Utc;
use dashmap::{DashMap, mapref::entry::Entry};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

use crate::{
    account::{Account, AccountError, AccountId},
    command::TransferCommandError,
    config::TransferConfig,
    transaction_log::{Transaction, TransactionLog, in_memory_log::InMemoryTransactionLog},
    transfer::{CancelToken, TransferCoordinator, TransferError},
};

/// Handle to an account owned by a [`Ledger`].
pub type AccountHandle = Arc<Account>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CreateAccountError {
    #[error("Account {account} already exists")]
    AccountExists { account: AccountId },
    #[error(transparent)]
    Account(#[from] AccountError),
}

/// Registry of accounts plus the coordinator and log used to move funds
/// between them. Shared between threads by reference.
pub struct Ledger<L = InMemoryTransactionLog> {
    accounts: DashMap<AccountId, AccountHandle>,
    coordinator: TransferCoordinator,
    log: L,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(TransferConfig::default())
    }
}

impl Ledger {
    pub fn new(config: TransferConfig) -> Self {
        Self::with_log(config, InMemoryTransactionLog::default())
    }
}

impl<L> Ledger<L>
where
    L: TransactionLog,
{
    pub fn with_log(config: TransferConfig, log: L) -> Self {
        Self {
            accounts: DashMap::new(),
            coordinator: TransferCoordinator::new(config),
            log,
        }
    }

    pub fn create_account(
        &self,
        id: AccountId,
        initial_balance: Decimal,
    ) -> Result<(), CreateAccountError> {
        let account = Account::new(id, initial_balance)?;
        // entry() holds the shard lock, so check and insert are one step
        match self.accounts.entry(id) {
            Entry::Occupied(_) => Err(CreateAccountError::AccountExists { account: id }),
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(account));
                debug!(account = id, balance = %initial_balance, "Account created");
                Ok(())
            }
        }
    }

    pub fn get_account(&self, id: AccountId) -> Option<AccountHandle> {
        self.accounts.get(&id).map(|account| Arc::clone(account.value()))
    }

    pub fn process_transfer(&self, from: AccountId, to: AccountId, amount: Decimal) -> bool {
        self.try_process_transfer(from, to, amount).is_ok()
    }

    pub fn try_process_transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
    ) -> Result<Transaction, TransferError> {
        self.execute(from, to, amount, None)
    }

    pub fn try_process_transfer_with_cancel(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
        cancel: &CancelToken,
    ) -> Result<Transaction, TransferError> {
        self.execute(from, to, amount, Some(cancel))
    }

    fn execute(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
        cancel: Option<&CancelToken>,
    ) -> Result<Transaction, TransferError> {
        let source = self
            .get_account(from)
            .ok_or(TransferError::AccountNotFound { account: from })?;
        let destination = self
            .get_account(to)
            .ok_or(TransferError::AccountNotFound { account: to })?;
        if amount <= Decimal::ZERO {
            return Err(TransferCommandError::InvalidAmount { amount }.into());
        }

        // recorded while both account locks are held, so history order is
        // the order in which transfers settled
        self.coordinator
            .settle(&source, &destination, amount, cancel, || {
                let transaction = Transaction::new(from, to, amount, Utc::now());
                self.log.record(transaction.clone());
                transaction
            })
    }

    /// Snapshot of every account handle, sorted by id.
    pub fn accounts(&self) -> Vec<AccountHandle> {
        let mut accounts: Vec<AccountHandle> = self
            .accounts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        accounts.sort_by_key(|account| account.id());
        accounts
    }

    /// Sum of all balances. Each balance is read under its own lock, so the
    /// result is only exact while no transfer is in flight.
    pub fn total_balance(&self) -> Decimal {
        self.accounts().iter().map(|account| account.balance()).sum()
    }

    pub fn transaction_log(&self) -> &L {
        &self.log
    }
}
