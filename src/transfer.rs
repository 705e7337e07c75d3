//! Two-account transfer protocol.
//!
//! Locks are always taken in ascending [`AccountId`] order, whatever the
//! direction of the transfer. Two transfers touching the same pair therefore
//! request the locks in the same order and can never wait on each other in a
//! cycle. Every acquisition is bounded by [`TransferConfig::lock_timeout`].
//!
//! Once both locks are held the source balance is checked again, since it
//! may have changed while we were waiting.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    account::{Account, AccountError, AccountId, BalanceGuard},
    command::{TransferCommand, TransferCommandError},
    config::TransferConfig,
};

const MIN_POLL_SLICE: Duration = Duration::from_millis(1);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransferError {
    #[error(transparent)]
    Command(#[from] TransferCommandError),
    #[error("Account {account} not found")]
    AccountNotFound { account: AccountId },
    #[error("Timed out waiting for the lock on account {account}")]
    LockTimeout { account: AccountId },
    #[error(transparent)]
    Account(#[from] AccountError),
    #[error("Transfer cancelled while waiting for the lock on account {account}")]
    Cancelled { account: AccountId },
}

/// Shared flag used to abandon transfers that are waiting for a lock.
///
/// Cancelling is sticky: the token stays cancelled so that whoever manages
/// the thread can see why the transfer gave up.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransferCoordinator {
    config: TransferConfig,
}

impl TransferCoordinator {
    pub fn new(config: TransferConfig) -> Self {
        Self { config }
    }

    /// Boolean form of [`Self::try_transfer`]: every failure is `false`.
    pub fn transfer(&self, source: &Account, destination: &Account, amount: Decimal) -> bool {
        self.try_transfer(source, destination, amount).is_ok()
    }

    pub fn try_transfer(
        &self,
        source: &Account,
        destination: &Account,
        amount: Decimal,
    ) -> Result<(), TransferError> {
        self.settle(source, destination, amount, None, || ())
    }

    pub fn try_transfer_with_cancel(
        &self,
        source: &Account,
        destination: &Account,
        amount: Decimal,
        cancel: &CancelToken,
    ) -> Result<(), TransferError> {
        self.settle(source, destination, amount, Some(cancel), || ())
    }

    /// Runs the transfer and, if it succeeds, calls `on_settled` before either
    /// lock is released. Anything `on_settled` locks is always taken after both
    /// account locks.
    pub(crate) fn settle<T>(
        &self,
        source: &Account,
        destination: &Account,
        amount: Decimal,
        cancel: Option<&CancelToken>,
        on_settled: impl FnOnce() -> T,
    ) -> Result<T, TransferError> {
        let command = TransferCommand::parse(source.id(), destination.id(), amount)?;

        let (first, second) = if source.id() < destination.id() {
            (source, destination)
        } else {
            (destination, source)
        };

        let mut first_guard = self.acquire(first, cancel)?;
        // on failure `first_guard` is dropped here, releasing the first lock
        let mut second_guard = self.acquire(second, cancel)?;

        let moved = if first_guard.account() == command.from {
            first_guard.debit_then_credit(&mut second_guard, command.amount)
        } else {
            second_guard.debit_then_credit(&mut first_guard, command.amount)
        };
        let outcome = moved.map(|()| on_settled());

        drop(second_guard);
        drop(first_guard);

        match &outcome {
            Ok(_) => debug!(
                from = command.from,
                to = command.to,
                amount = %command.amount,
                "Transfer settled"
            ),
            Err(err) => debug!(
                from = command.from,
                to = command.to,
                amount = %command.amount,
                error = %err,
                "Transfer rejected"
            ),
        }
        outcome.map_err(TransferError::from)
    }

    /// Waits for `account`'s lock until the configured timeout elapses or
    /// `cancel` fires. At least one attempt is always made.
    fn acquire<'a>(
        &self,
        account: &'a Account,
        cancel: Option<&CancelToken>,
    ) -> Result<BalanceGuard<'a>, TransferError> {
        let deadline = Instant::now() + self.config.lock_timeout;
        loop {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                warn!(account = account.id(), "Transfer cancelled while waiting for lock");
                return Err(TransferError::Cancelled {
                    account: account.id(),
                });
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if let Some(guard) = account.try_lock_for(self.wait_slice(remaining, cancel)) {
                return Ok(guard);
            }

            if Instant::now() >= deadline {
                warn!(
                    account = account.id(),
                    timeout_ms = self.config.lock_timeout.as_millis() as u64,
                    "Lock acquisition timed out"
                );
                return Err(TransferError::LockTimeout {
                    account: account.id(),
                });
            }
        }
    }

    /// How long one lock attempt may block. With a cancel token the wait is
    /// cut into poll intervals of at least [`MIN_POLL_SLICE`].
    fn wait_slice(&self, remaining: Duration, cancel: Option<&CancelToken>) -> Duration {
        match cancel {
            Some(_) => remaining.min(self.config.cancel_poll_interval.max(MIN_POLL_SLICE)),
            None => remaining,
        }
    }
}
