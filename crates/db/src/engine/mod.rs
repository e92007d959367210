//! Ledger transaction engine.
//!
//! Every money movement runs the same sequence:
//! 1. Return the committed row if the idempotency key was already used
//! 2. Resolve account references with non-locking reads and run the pure pre-flight checks
//! 3. Apply the plan inside one bounded unit of work (see [`unit_of_work`])
//! 4. Write one audit entry, bounded and best-effort
//! 5. Return the committed row, re-read from the store

mod unit_of_work;


use std::future::Future;
use std::sync::Arc;

use corebank_core::audit::{AuditEntry, AuditError, AuditSink};
use corebank_core::ledger::validation::{ensure_owner, validate_description};
use corebank_core::ledger::{
    AccountRef, AccountSnapshot, HistoryFilter, IdempotencyKey, LedgerError, LedgerService,
    Metadata, MovementPlan, PostingRequest, Principal, TransactionType, TransferRequest,
};
use corebank_shared::config::LedgerConfig;
use corebank_shared::types::{AccountId, Amount, PageRequest, PageResponse, TransactionId};
use sea_orm::{DatabaseConnection, DbErr};
use tracing::Instrument;

use crate::entities::ledger_transactions;
use crate::repositories::{AccountRepository, LedgerRepository, NewLedgerTransaction};

use self::unit_of_work::UnitOfWorkError;

/// A committed ledger row as returned to callers.
pub type LedgerTransaction = ledger_transactions::Model;

/// Everything about a request except the accounts it touches.
struct Submission {
    transaction_type: TransactionType,
    idempotency_key: IdempotencyKey,
    amount: Amount,
    description: String,
    metadata: Metadata,
}

/// How a request that got past the short-circuit was resolved.
enum Resolution {
    /// This call committed the row; it has not been read back yet.
    Committed {
        /// Id of the committed row.
        id: TransactionId,
        /// The movement that was applied.
        plan: MovementPlan,
    },
    /// A concurrent call with the same key committed first.
    LostRace(LedgerTransaction),
}

/// Executes transfers, deposits, withdrawals and system postings.
#[derive(Clone)]
pub struct LedgerEngine {
    db: DatabaseConnection,
    accounts: AccountRepository,
    ledger: LedgerRepository,
    audit: Arc<dyn AuditSink>,
    config: LedgerConfig,
}

impl std::fmt::Debug for LedgerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LedgerEngine {
    /// Creates an engine over a connection pool.
    #[must_use]
    pub fn new(db: DatabaseConnection, audit: Arc<dyn AuditSink>, config: LedgerConfig) -> Self {
        Self {
            accounts: AccountRepository::new(db.clone()),
            ledger: LedgerRepository::new(db.clone()),
            db,
            audit,
            config,
        }
    }

    /// Moves `amount` from an account the principal owns to any active account of the
    /// same currency.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError`]; no balance changes on error.
    pub async fn transfer(
        &self,
        principal: &Principal,
        request: TransferRequest,
    ) -> Result<LedgerTransaction, LedgerError> {
        let TransferRequest {
            source,
            destination,
            amount,
            description,
            idempotency_key,
            metadata,
        } = request;

        let submission = Submission {
            transaction_type: TransactionType::Transfer,
            idempotency_key,
            amount,
            description,
            metadata,
        };

        self.execute(principal, submission, async {
            let source = self.resolve(&source).await?;
            let destination = self.resolve(&destination).await?;
            LedgerService::plan_transfer(principal, &source, &destination, amount)
        })
        .await
    }

    /// Credits an active account. No ownership is required.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError`]; no balance changes on error.
    pub async fn deposit(
        &self,
        principal: &Principal,
        request: PostingRequest,
    ) -> Result<LedgerTransaction, LedgerError> {
        self.post(principal, TransactionType::Deposit, request, |_, account, amount| {
            LedgerService::plan_deposit(account, amount)
        })
        .await
    }

    /// Debits an account the principal owns.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError`]; no balance changes on error.
    pub async fn withdraw(
        &self,
        principal: &Principal,
        request: PostingRequest,
    ) -> Result<LedgerTransaction, LedgerError> {
        self.post(
            principal,
            TransactionType::Withdrawal,
            request,
            LedgerService::plan_withdrawal,
        )
        .await
    }

    /// Credits interest to an account on behalf of `operator`.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError`]; no balance changes on error.
    pub async fn post_interest(
        &self,
        operator: &Principal,
        request: PostingRequest,
    ) -> Result<LedgerTransaction, LedgerError> {
        self.post(operator, TransactionType::Interest, request, |_, account, amount| {
            LedgerService::plan_interest(account, amount)
        })
        .await
    }

    /// Debits a fee from an account on behalf of `operator`. The account owner is not checked.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError`]; `InsufficientFunds` if the fee exceeds the balance.
    pub async fn charge_fee(
        &self,
        operator: &Principal,
        request: PostingRequest,
    ) -> Result<LedgerTransaction, LedgerError> {
        self.post(operator, TransactionType::Fee, request, |_, account, amount| {
            LedgerService::plan_fee(account, amount)
        })
        .await
    }

    /// Pages through the transactions of an account the principal owns, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`, `NotAccountOwner` or a transient store failure.
    pub async fn history(
        &self,
        principal: &Principal,
        account: &AccountRef,
        filter: &HistoryFilter,
        page: PageRequest,
    ) -> Result<PageResponse<LedgerTransaction>, LedgerError> {
        let account = self.resolve(account).await?;
        ensure_owner(principal, &account)?;

        self.ledger
            .list_for_account(account.id, filter, page)
            .await
            .map_err(store_error)
    }

    /// Looks up one transaction the principal initiated or whose accounts it owns.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` if no such transaction is visible to the principal.
    pub async fn transaction(
        &self,
        principal: &Principal,
        id: TransactionId,
    ) -> Result<LedgerTransaction, LedgerError> {
        let row = self
            .ledger
            .find_by_id(id)
            .await
            .map_err(store_error)?
            .ok_or(LedgerError::TransactionNotFound(id))?;

        if row.initiated_by == principal.user_id.into_inner() {
            return Ok(row);
        }

        for account_id in [row.from_account_id, row.to_account_id].into_iter().flatten() {
            let account = self
                .accounts
                .find_by_id(AccountId::from_uuid(account_id))
                .await
                .map_err(store_error)?;
            if account.is_some_and(|a| a.owner_id == principal.user_id.into_inner()) {
                return Ok(row);
            }
        }

        Err(LedgerError::TransactionNotFound(id))
    }

    async fn post<P>(
        &self,
        principal: &Principal,
        transaction_type: TransactionType,
        request: PostingRequest,
        plan: P,
    ) -> Result<LedgerTransaction, LedgerError>
    where
        P: FnOnce(&Principal, &AccountSnapshot, Amount) -> Result<MovementPlan, LedgerError>,
    {
        let PostingRequest {
            account,
            amount,
            description,
            idempotency_key,
            metadata,
        } = request;

        let submission = Submission {
            transaction_type,
            idempotency_key,
            amount,
            description,
            metadata,
        };

        self.execute(principal, submission, async {
            let account = self.resolve(&account).await?;
            plan(principal, &account, amount)
        })
        .await
    }

    async fn execute<F>(
        &self,
        principal: &Principal,
        submission: Submission,
        plan: F,
    ) -> Result<LedgerTransaction, LedgerError>
    where
        F: Future<Output = Result<MovementPlan, LedgerError>>,
    {
        let span = tracing::info_span!(
            "ledger",
            operation = %submission.transaction_type,
            principal = %principal.user_id,
            idempotency_key = %submission.idempotency_key,
            transaction_id = tracing::field::Empty,
        );

        async move {
            let span = tracing::Span::current();

            match self.ledger.find_by_idempotency_key(&submission.idempotency_key).await {
                Ok(Some(existing)) => {
                    span.record("transaction_id", tracing::field::display(existing.id));
                    tracing::info!("idempotent replay");
                    return Ok(existing);
                }
                Ok(None) => {}
                Err(err) => {
                    let err = store_error(err);
                    tracing::warn!(error = %err, "idempotency lookup failed");
                    self.record_audit(principal, &submission, Err(&err)).await;
                    return Err(err);
                }
            }

            match self.run(principal, &submission, plan).await {
                Ok(Resolution::Committed { id, plan }) => {
                    span.record("transaction_id", tracing::field::display(id));
                    tracing::info!("transaction committed");
                    self.record_audit(principal, &submission, Ok((id, &plan))).await;
                    self.read_committed(id).await
                }
                Ok(Resolution::LostRace(row)) => {
                    span.record("transaction_id", tracing::field::display(row.id));
                    tracing::info!("concurrent duplicate resolved to the committed row");
                    Ok(row)
                }
                Err(err) => {
                    if err.is_retryable() {
                        tracing::warn!(error = %err, "transaction rolled back");
                    } else {
                        tracing::info!(
                            error = %err,
                            failure_kind = err.kind().as_str(),
                            "transaction rejected"
                        );
                    }
                    self.record_audit(principal, &submission, Err(&err)).await;
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run<F>(
        &self,
        principal: &Principal,
        submission: &Submission,
        plan: F,
    ) -> Result<Resolution, LedgerError>
    where
        F: Future<Output = Result<MovementPlan, LedgerError>>,
    {
        validate_description(&submission.description)?;
        let plan = plan.await?;

        let row = NewLedgerTransaction::from_plan(
            &plan,
            principal,
            submission.idempotency_key.clone(),
            submission.description.clone(),
            submission.metadata.clone(),
        );

        let applied = tokio::time::timeout(
            self.config.unit_of_work_timeout(),
            unit_of_work::apply(
                &self.db,
                &self.accounts,
                &self.ledger,
                self.config.lock_timeout(),
                &plan,
                row,
            ),
        )
        .await;

        let id = match applied {
            Ok(Ok(id)) => id,
            Ok(Err(UnitOfWorkError::Ledger(err))) => return Err(err),
            Ok(Err(UnitOfWorkError::DuplicateKey)) => {
                let winner = self
                    .ledger
                    .find_by_idempotency_key(&submission.idempotency_key)
                    .await
                    .map_err(store_error)?
                    .ok_or_else(|| {
                        LedgerError::Store("idempotency key taken but no row visible".into())
                    })?;
                return Ok(Resolution::LostRace(winner));
            }
            Ok(Err(UnitOfWorkError::Store(err))) => return Err(store_error(err)),
            // Dropping the unfinished unit of work rolls it back.
            Err(_elapsed) => return Err(LedgerError::Timeout),
        };

        Ok(Resolution::Committed { id, plan })
    }

    /// Reads back a row this engine just committed. A failure here is reported as transient:
    /// the movement stands and a retry with the same key replays it.
    async fn read_committed(&self, id: TransactionId) -> Result<LedgerTransaction, LedgerError> {
        let row = match self.ledger.find_by_id(id).await {
            Ok(Some(row)) => Ok(row),
            Ok(None) => Err(LedgerError::Store(format!(
                "transaction {id} committed but not visible"
            ))),
            Err(err) => Err(LedgerError::Store(format!(
                "transaction {id} committed but could not be read back: {err}"
            ))),
        };
        if let Err(err) = &row {
            tracing::warn!(error = %err, "read-back after commit failed");
        }
        row
    }

    async fn resolve(&self, reference: &AccountRef) -> Result<AccountSnapshot, LedgerError> {
        self.accounts
            .resolve(reference)
            .await
            .map_err(store_error)?
            .ok_or_else(|| LedgerError::AccountNotFound(reference.to_string()))
    }

    async fn record_audit(
        &self,
        principal: &Principal,
        submission: &Submission,
        outcome: Result<(TransactionId, &MovementPlan), &LedgerError>,
    ) {
        let action = submission.transaction_type.audit_action();
        let entry = match outcome {
            Ok((id, plan)) => AuditEntry::success(principal.user_id, action, id)
                .with("from_account_id", plan.source.map(|id| id.to_string()))
                .with("to_account_id", plan.destination.map(|id| id.to_string()))
                .with("currency", plan.currency.as_str()),
            Err(err) => AuditEntry::failure(principal.user_id, action, err),
        }
        .with("idempotency_key", submission.idempotency_key.as_str())
        .with("amount", submission.amount.to_string());

        let write = tokio::time::timeout(self.config.audit_timeout(), self.audit.record(entry));
        let result = match write.await {
            Ok(result) => result,
            Err(_elapsed) => Err(AuditError::Timeout),
        };
        if let Err(err) = result {
            tracing::error!(error = %err, "audit write failed");
        }
    }
}

fn store_error(err: DbErr) -> LedgerError {
    LedgerError::Store(err.to_string())
}
