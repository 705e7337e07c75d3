//! This module could be a separate crate on its own, to bootstrap [`concurrent_ledger`] within
//! binary but for simplicity purposes, I include this module directly in the library.

use std::{
    io::{Read, Write},
    num::NonZeroUsize,
    thread,
};

use crate::{
    account::AccountId,
    config::TransferConfig,
    ledger::{CreateAccountError, Ledger},
    transfer::TransferError,
};
use anyhow::Result;
use csv_parser::{CsvRowParser, RowKind};
use csv_printer::{AccountRow, print_accounts};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;

pub mod csv_parser;
pub mod csv_printer;

#[derive(Debug, Error)]
pub enum RowError {
    #[error("Malformed row: {0}")]
    Parse(#[from] csv::Error),
    #[error("Transfer row is missing the destination account")]
    MissingDestination,
    #[error(transparent)]
    Create(#[from] CreateAccountError),
    #[error(transparent)]
    Transfer(#[from] TransferError),
}

struct PendingTransfer {
    line: u64,
    from: AccountId,
    to: AccountId,
    amount: Decimal,
}

/// Opens accounts in file order, then runs every transfer row concurrently
/// on `workers` threads against one shared ledger, and prints the final
/// balances.
pub struct Service<'w, R, W: 'w> {
    pub input: R,
    pub output: &'w mut W,
    pub config: TransferConfig,
    pub workers: NonZeroUsize,
    pub error_printer: Box<dyn FnMut(u64, RowError)>,
}

impl<'w, R, W> Service<'w, R, W>
where
    R: Read,
    W: Write + 'w,
{
    pub fn run(mut self) -> Result<Ledger> {
        let ledger = Ledger::new(self.config);
        let mut transfers = Vec::new();

        for (line, row) in CsvRowParser::new(self.input) {
            let row = match row {
                Ok(row) => row,
                Err(err) => {
                    (self.error_printer)(line, err.into());
                    continue;
                }
            };
            match (row.kind, row.to) {
                (RowKind::Open, _) => {
                    if let Err(err) = ledger.create_account(row.account, row.amount) {
                        (self.error_printer)(line, err.into());
                    }
                }
                (RowKind::Transfer, Some(to)) => transfers.push(PendingTransfer {
                    line,
                    from: row.account,
                    to,
                    amount: row.amount,
                }),
                (RowKind::Transfer, None) => {
                    (self.error_printer)(line, RowError::MissingDestination)
                }
            }
        }

        let mut outcomes = run_transfers(&ledger, &transfers, self.workers);
        outcomes.sort_by_key(|(line, _)| *line);

        let mut failed = 0usize;
        for (line, outcome) in outcomes {
            if let Err(err) = outcome {
                failed += 1;
                (self.error_printer)(line, err.into());
            }
        }
        info!(
            submitted = transfers.len(),
            settled = transfers.len() - failed,
            failed,
            "Transfers processed"
        );

        print_accounts(
            self.output,
            ledger.accounts().iter().map(|account| AccountRow {
                account: account.id(),
                balance: account.balance(),
            }),
        )?;
        Ok(ledger)
    }
}

fn run_transfers(
    ledger: &Ledger,
    transfers: &[PendingTransfer],
    workers: NonZeroUsize,
) -> Vec<(u64, Result<(), TransferError>)> {
    let workers = workers.get();
    thread::scope(|s| {
        let handles: Vec<_> = (0..workers)
            .map(|worker| {
                s.spawn(move || {
                    transfers
                        .iter()
                        .skip(worker)
                        .step_by(workers)
                        .map(|t| {
                            let outcome = ledger
                                .try_process_transfer(t.from, t.to, t.amount)
                                .map(|_| ());
                            (t.line, outcome)
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| match handle.join() {
                Ok(outcomes) => outcomes,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    })
}
