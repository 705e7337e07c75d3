use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::account::AccountId;

pub mod in_memory_log;

/// A completed transfer. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    pub fn new(from: AccountId, to: AccountId, amount: Decimal, timestamp: DateTime<Utc>) -> Self {
        Self {
            from,
            to,
            amount,
            timestamp,
        }
    }
}

/// Append-only sink for successful transfers.
///
/// Entries appear in the order transfers completed, which is not necessarily
/// the order they were submitted in.
pub trait TransactionLog: Send + Sync {
    fn record(&self, transaction: Transaction);

    /// Snapshot of all recorded transactions in append order.
    fn history(&self) -> Vec<Transaction>;
}
