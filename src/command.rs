use rust_decimal::Decimal;
use thiserror::Error;

use crate::account::AccountId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransferCommandError {
    #[error("Transfer amount must be positive, got {amount}")]
    InvalidAmount { amount: Decimal },
    #[error("Cannot transfer from account {account} to itself")]
    SelfTransfer { account: AccountId },
}

/// A validated transfer request. Holding one means the checks that need no
/// lock have already passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferCommand {
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Decimal,
}

impl TransferCommand {
    pub fn parse(
        from: AccountId,
        to: AccountId,
        amount: Decimal,
    ) -> Result<Self, TransferCommandError> {
        if from == to {
            return Err(TransferCommandError::SelfTransfer { account: from });
        }
        if amount <= Decimal::ZERO {
            return Err(TransferCommandError::InvalidAmount { amount });
        }
        Ok(Self { from, to, amount })
    }
}
