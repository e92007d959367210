//! Corebank ledger operator CLI.
//!
//! Runs one engine operation as the given principal and prints the result as JSON on stdout.
//! Ledger failures are printed as JSON on stderr; the exit code is 75 when retrying with the
//! same idempotency key may succeed and 1 otherwise.

mod cli;
mod telemetry;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use corebank_core::audit::AuditSink;
use corebank_core::ledger::{LedgerError, Principal};
use corebank_db::{AuditRepository, LedgerEngine, LedgerTransaction};
use corebank_shared::AppConfig;
use corebank_shared::types::PageResponse;
use serde::Serialize;
use tracing::info;

use cli::{Cli, Command};

/// Exit code for failures that are safe to retry (`EX_TEMPFAIL`).
const EXIT_RETRYABLE: u8 = 75;

#[derive(Serialize)]
#[serde(untagged)]
enum Output {
    Transaction(LedgerTransaction),
    Page(PageResponse<LedgerTransaction>),
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load().context("failed to load configuration")?;
    telemetry::init(&config.logging);

    let db = corebank_db::connect_with(&config.database)
        .await
        .context("failed to connect to database")?;
    info!("Connected to database");

    let audit: Arc<dyn AuditSink> = Arc::new(AuditRepository::new(db.clone()));
    let engine = LedgerEngine::new(db, audit, config.ledger);
    let principal = Principal::new(cli.principal);

    match run(&engine, &principal, cli.command).await {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            let report = serde_json::json!({
                "error": err.error_code(),
                "kind": err.kind(),
                "message": err.to_string(),
                "retryable": err.is_retryable(),
            });
            eprintln!("{}", serde_json::to_string_pretty(&report)?);
            Ok(if err.is_retryable() {
                ExitCode::from(EXIT_RETRYABLE)
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

async fn run(
    engine: &LedgerEngine,
    principal: &Principal,
    command: Command,
) -> Result<Output, LedgerError> {
    let row = match command {
        Command::Transfer {
            source,
            destination,
            amount,
            submission,
        } => {
            let request = cli::transfer_request(source, destination, amount, submission)?;
            engine.transfer(principal, request).await?
        }
        Command::Deposit(args) => engine.deposit(principal, args.into_request()?).await?,
        Command::Withdraw(args) => engine.withdraw(principal, args.into_request()?).await?,
        Command::Interest(args) => engine.post_interest(principal, args.into_request()?).await?,
        Command::Fee(args) => engine.charge_fee(principal, args.into_request()?).await?,
        Command::History {
            account,
            page,
            per_page,
            transaction_type,
            from,
            to,
        } => {
            let (filter, page) = cli::history_query(page, per_page, transaction_type, from, to);
            let page = engine.history(principal, &account, &filter, page).await?;
            return Ok(Output::Page(page));
        }
        Command::Show { id } => engine.transaction(principal, id).await?,
    };

    Ok(Output::Transaction(row))
}
