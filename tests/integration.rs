use std::{cell::RefCell, num::NonZeroUsize, rc::Rc, str::from_utf8};

use concurrent_ledger::{
    CreateAccountError, TransactionLog, TransferConfig,
    account::AccountError,
    bin_utils::{RowError, Service},
    command::TransferCommandError,
    transfer::TransferError,
};
use rust_decimal::{Decimal, prelude::FromPrimitive};

const TEST_FILE: &str = include_str!("transfers.csv");

#[test]
fn process_transfers() {
    let errors = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&errors);

    let mut output = Vec::new();
    let service = Service {
        input: TEST_FILE.as_bytes(),
        output: &mut output,
        config: TransferConfig::default(),
        workers: NonZeroUsize::new(8).unwrap(),
        error_printer: Box::new(move |_line, err| sink.borrow_mut().push(err)),
    };
    let ledger = service.run().unwrap();

    assert_eq!(
        from_utf8(&output).unwrap(),
        "account,balance\n1,0\n2,1000\n3,500\n"
    );

    let errors = errors.borrow();
    let count = |pred: fn(&RowError) -> bool| errors.iter().filter(|e| pred(e)).count();
    assert_eq!(errors.len(), 55);
    assert_eq!(
        count(|e| matches!(
            e,
            RowError::Create(CreateAccountError::AccountExists { account: 1 })
        )),
        1
    );
    assert_eq!(
        count(|e| matches!(
            e,
            RowError::Create(CreateAccountError::Account(
                AccountError::NegativeInitialBalance { .. }
            ))
        )),
        1
    );
    assert_eq!(count(|e| matches!(e, RowError::MissingDestination)), 1);
    assert_eq!(
        count(|e| matches!(
            e,
            RowError::Transfer(TransferError::Account(AccountError::InsufficientFunds {
                account: 1,
                ..
            }))
        )),
        50
    );
    assert_eq!(
        count(|e| matches!(
            e,
            RowError::Transfer(TransferError::AccountNotFound { account: 9 })
        )),
        1
    );
    assert_eq!(
        count(|e| matches!(
            e,
            RowError::Transfer(TransferError::Command(TransferCommandError::SelfTransfer {
                account: 3
            }))
        )),
        1
    );

    let history = ledger.transaction_log().history();
    assert_eq!(history.len(), 55);
    assert_eq!(
        history.iter().filter(|t| (t.from, t.to) == (1, 2)).count(),
        50
    );
    assert_eq!(
        history.iter().map(|t| t.amount).sum::<Decimal>(),
        Decimal::from_u32(1000).unwrap()
    );
}

#[test]
fn single_worker_matches_concurrent_result() {
    let mut output = Vec::new();
    let service = Service {
        input: TEST_FILE.as_bytes(),
        output: &mut output,
        config: TransferConfig::default(),
        workers: NonZeroUsize::MIN,
        error_printer: Box::new(|_, _| {}),
    };
    service.run().unwrap();
    assert_eq!(
        from_utf8(&output).unwrap(),
        "account,balance\n1,0\n2,1000\n3,500\n"
    );
}
