use parking_lot::Mutex;

use super::{Transaction, TransactionLog};

#[derive(Debug, Default)]
pub struct InMemoryTransactionLog {
    entries: Mutex<Vec<Transaction>>,
}

impl InMemoryTransactionLog {
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl TransactionLog for InMemoryTransactionLog {
    fn record(&self, transaction: Transaction) {
        self.entries.lock().push(transaction);
    }

    fn history(&self) -> Vec<Transaction> {
        self.entries.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use chrono::Utc;
    use rust_decimal::{Decimal, prelude::FromPrimitive};

    use super::*;

    #[test]
    fn history_keeps_append_order() {
        let log = InMemoryTransactionLog::default();
        assert!(log.is_empty());

        log.record(Transaction::new(1, 2, Decimal::from_u32(10).unwrap(), Utc::now()));
        log.record(Transaction::new(2, 3, Decimal::from_u32(20).unwrap(), Utc::now()));

        let history = log.history();
        assert_eq!(log.len(), 2);
        assert_eq!((history[0].from, history[0].to), (1, 2));
        assert_eq!((history[1].from, history[1].to), (2, 3));
        assert!(history[0].timestamp <= history[1].timestamp);
    }

    #[test]
    fn history_is_a_snapshot() {
        let log = InMemoryTransactionLog::default();
        log.record(Transaction::new(1, 2, Decimal::ONE, Utc::now()));
        let snapshot = log.history();
        log.record(Transaction::new(2, 1, Decimal::ONE, Utc::now()));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn concurrent_records_are_not_lost() {
        let log = InMemoryTransactionLog::default();
        thread::scope(|s| {
            for worker in 0..8u32 {
                let log = &log;
                s.spawn(move || {
                    for _ in 0..100 {
                        log.record(Transaction::new(worker, worker + 1, Decimal::ONE, Utc::now()));
                    }
                });
            }
        });
        let history = log.history();
        assert_eq!(history.len(), 800);
        for worker in 0..8u32 {
            assert_eq!(history.iter().filter(|t| t.from == worker).count(), 100);
        }
    }
}
