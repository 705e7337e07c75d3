/// A single account: its balance, its lock, and the debit/credit step that
/// may only run while both participating locks are held.
pub mod account;

/// Transfer requests validated before any lock is taken.
pub mod command;

/// Lock acquisition policy (timeouts, cancellation polling).
pub mod config;

/// Registry of accounts. Entry point for creating accounts and moving funds.
pub mod ledger;

/// Append-only log of completed transfers, plus "in memory" implementation.
pub mod transaction_log;

/// The transfer protocol: ordered lock acquisition, re-validation under the
/// locks, and settlement.
pub mod transfer;

/// Ideally, this module should exists on its own crate, as a way to
/// bootstrap core logic. However, I want to use it for integration test
/// so I put it here.
pub mod bin_utils;

pub use account::{Account, AccountId};
pub use config::TransferConfig;
pub use ledger::{AccountHandle, CreateAccountError, Ledger};
pub use transaction_log::{Transaction, TransactionLog, in_memory_log::InMemoryTransactionLog};
pub use transfer::{CancelToken, TransferCoordinator, TransferError};
