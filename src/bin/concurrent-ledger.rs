use std::{fs::File, num::NonZeroUsize, thread};

use anyhow::{Context, Result};
use concurrent_ledger::{
    bin_utils::{RowError, Service, csv_printer::print_history},
    config::TransferConfig,
    transaction_log::TransactionLog,
};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut args = std::env::args().skip(1);
    let filename = args
        .next()
        .context("Expected a file name as the first argument")?;
    let history_path = args.next();
    let file = File::open(&filename).with_context(|| format!("Failed to open `{filename}`"))?;

    let config = TransferConfig::from_env();
    config.validate().context("Invalid transfer configuration")?;
    let workers = thread::available_parallelism().unwrap_or(NonZeroUsize::MIN);
    info!(
        workers = workers.get(),
        lock_timeout_ms = config.lock_timeout.as_millis() as u64,
        "Starting ledger"
    );

    let service = Service {
        input: file,
        output: &mut std::io::stdout(),
        config,
        workers,
        error_printer: Box::new(|line, err| {
            match err {
                RowError::Transfer(err) => {
                    // rejected transfers are business outcomes, not input errors
                    debug!(line, error = %err, "Transfer failed")
                }
                err => eprintln!("Error at line {line}: {err}"),
            }
        }),
    };
    let ledger = service.run()?;

    if let Some(path) = history_path {
        let mut file =
            File::create(&path).with_context(|| format!("Failed to create `{path}`"))?;
        print_history(&mut file, ledger.transaction_log().history().into_iter())?;
        info!(path = %path, "Transaction history written");
    }
    Ok(())
}
