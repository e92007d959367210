//! The atomic unit of work behind every money movement.
//!
//! Runs at `READ COMMITTED` so that a caller blocked on a row lock reads the winner's
//! committed balance once the lock is granted. Locks are taken in the plan's leg order,
//! which is ascending account id.

use std::time::Duration;

use corebank_core::ledger::{LedgerError, LedgerService, MovementPlan};
use corebank_shared::types::TransactionId;
use sea_orm::{
    AccessMode, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, IsolationLevel,
    SqlErr, TransactionTrait,
};

use crate::repositories::{AccountRepository, LedgerRepository, NewLedgerTransaction};

/// Name of the unique constraint on `ledger_transactions.idempotency_key`.
pub(super) const IDEMPOTENCY_CONSTRAINT: &str = "uq_ledger_transactions_idempotency_key";

/// Why a unit of work was rolled back.
#[derive(Debug, thiserror::Error)]
pub(super) enum UnitOfWorkError {
    /// A ledger rule failed under lock.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Another unit of work committed the same idempotency key first.
    #[error("idempotency key already committed")]
    DuplicateKey,

    /// The store failed.
    #[error("store error: {0}")]
    Store(DbErr),
}

impl From<DbErr> for UnitOfWorkError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(message))
                if message.contains(IDEMPOTENCY_CONSTRAINT) =>
            {
                Self::DuplicateKey
            }
            _ => Self::Store(err),
        }
    }
}

/// Applies `plan` and inserts `row` in one transaction. Nothing survives an error.
pub(super) async fn apply(
    db: &DatabaseConnection,
    accounts: &AccountRepository,
    ledger: &LedgerRepository,
    lock_timeout: Duration,
    plan: &MovementPlan,
    row: NewLedgerTransaction,
) -> Result<TransactionId, UnitOfWorkError> {
    let txn = db
        .begin_with_config(Some(IsolationLevel::ReadCommitted), Some(AccessMode::ReadWrite))
        .await?;

    match apply_locked(&txn, accounts, ledger, lock_timeout, plan, row).await {
        Ok(id) => {
            txn.commit().await?;
            Ok(id)
        }
        Err(err) => {
            if let Err(rollback) = txn.rollback().await {
                tracing::warn!(error = %rollback, "rollback failed; connection discarded");
            }
            Err(err)
        }
    }
}

async fn apply_locked(
    txn: &DatabaseTransaction,
    accounts: &AccountRepository,
    ledger: &LedgerRepository,
    lock_timeout: Duration,
    plan: &MovementPlan,
    row: NewLedgerTransaction,
) -> Result<TransactionId, UnitOfWorkError> {
    txn.execute_unprepared(&format!(
        "SET LOCAL lock_timeout = '{}ms'",
        lock_timeout.as_millis()
    ))
    .await?;

    let mut locked = Vec::with_capacity(plan.legs().len());
    for account_id in plan.lock_order() {
        let balance = accounts
            .lock_active(txn, account_id)
            .await?
            .ok_or(LedgerError::AccountUnavailable(account_id))?;
        locked.push(balance);
    }

    let updates = plan
        .legs()
        .iter()
        .zip(locked)
        .map(|(leg, balance)| {
            LedgerService::apply_leg(balance, leg).map(|next| (leg.account_id, next))
        })
        .collect::<Result<Vec<_>, _>>()?;

    for (account_id, balance) in updates {
        accounts.set_balance(txn, account_id, balance).await?;
    }

    Ok(ledger.insert_completed(txn, row).await?)
}
