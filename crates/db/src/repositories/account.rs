//! Account repository: the engine-facing slice of the account store.
//!
//! Non-locking reads serve pre-flight resolution. `lock_active` and `set_balance` take the
//! caller's connection and are only ever called from inside the engine's unit of work.

use corebank_core::ledger::validation::parse_account_ref;
use corebank_core::ledger::{AccountRef, AccountSnapshot, AccountStatus as CoreAccountStatus};
use corebank_shared::types::{AccountId, CurrencyCode, UserId};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, QuerySelect, Set, SqlErr,
};

use crate::entities::{
    accounts,
    sea_orm_active_enums::{AccountStatus, AccountType},
};

/// Error types for account provisioning and management.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Account not found.
    #[error("Account not found: {0}")]
    NotFound(AccountId),

    /// Account number is already taken.
    #[error("Account number already exists: {0}")]
    DuplicateNumber(String),

    /// Account number is not 6-34 ASCII alphanumerics.
    #[error("Invalid account number: {0}")]
    InvalidNumber(String),

    /// Opening balance below zero.
    #[error("Opening balance must not be negative")]
    NegativeOpeningBalance,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Owning principal.
    pub owner_id: UserId,
    /// Human-readable account number.
    pub number: String,
    /// Product type.
    pub account_type: AccountType,
    /// Account currency.
    pub currency: CurrencyCode,
    /// Balance the account is provisioned with.
    pub opening_balance: Decimal,
}

impl CreateAccountInput {
    /// Checking account with a zero opening balance.
    #[must_use]
    pub fn new(owner_id: UserId, number: impl Into<String>, currency: CurrencyCode) -> Self {
        Self {
            owner_id,
            number: number.into(),
            account_type: AccountType::Checking,
            currency,
            opening_balance: Decimal::ZERO,
        }
    }

    /// Sets the opening balance.
    #[must_use]
    pub fn with_opening_balance(mut self, balance: Decimal) -> Self {
        self.opening_balance = balance;
        self
    }

    /// Sets the product type.
    #[must_use]
    pub fn with_type(mut self, account_type: AccountType) -> Self {
        self.account_type = account_type;
        self
    }
}

/// Account repository.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Provisions an active account.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The number is malformed or already taken
    /// - The opening balance is negative
    /// - Database operation fails
    pub async fn create_account(
        &self,
        input: CreateAccountInput,
    ) -> Result<accounts::Model, AccountError> {
        // The number must stay addressable as a number, not be mistaken for an id.
        let number = match parse_account_ref(&input.number) {
            Ok(AccountRef::Number(number)) => number,
            _ => return Err(AccountError::InvalidNumber(input.number)),
        };
        if input.opening_balance.is_sign_negative() {
            return Err(AccountError::NegativeOpeningBalance);
        }

        let now = chrono::Utc::now().into();
        let account = accounts::ActiveModel {
            id: Set(AccountId::new().into_inner()),
            owner_id: Set(input.owner_id.into_inner()),
            number: Set(number.clone()),
            account_type: Set(input.account_type),
            balance: Set(input.opening_balance),
            currency: Set(input.currency.to_string()),
            status: Set(AccountStatus::Active),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match account.insert(&self.db).await {
            Ok(model) => Ok(model),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(AccountError::DuplicateNumber(number))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Changes an account's lifecycle status (account management, not the engine).
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account does not exist.
    pub async fn set_status(
        &self,
        id: AccountId,
        status: CoreAccountStatus,
    ) -> Result<accounts::Model, AccountError> {
        let account = self.find_by_id(id).await?.ok_or(AccountError::NotFound(id))?;

        let mut active = account.into_active_model();
        active.status = Set(status.into());
        active.updated_at = Set(chrono::Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Finds an account by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: AccountId) -> Result<Option<accounts::Model>, DbErr> {
        accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
    }

    /// Finds an account by its number, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_number(&self, number: &str) -> Result<Option<accounts::Model>, DbErr> {
        accounts::Entity::find()
            .filter(accounts::Column::Number.eq(number.trim().to_ascii_uppercase()))
            .one(&self.db)
            .await
    }

    /// Resolves a caller reference to a balance-free snapshot without locking.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored row is malformed.
    pub async fn resolve(&self, reference: &AccountRef) -> Result<Option<AccountSnapshot>, DbErr> {
        let model = match reference {
            AccountRef::Id(id) => self.find_by_id(*id).await?,
            AccountRef::Number(number) => self.find_by_number(number).await?,
        };
        model.map(snapshot).transpose()
    }

    /// Current balance, for operator display only. The engine never uses this read.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn balance(&self, id: AccountId) -> Result<Option<Decimal>, DbErr> {
        Ok(self.find_by_id(id).await?.map(|account| account.balance))
    }

    /// Locks an active account row (`SELECT ... FOR UPDATE`) and returns its balance.
    ///
    /// Returns `None` if the account is missing or not active. The lock is held until the
    /// surrounding transaction ends.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails, including a store-side lock timeout.
    pub async fn lock_active<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: AccountId,
    ) -> Result<Option<Decimal>, DbErr> {
        let account = accounts::Entity::find_by_id(id.into_inner())
            .filter(accounts::Column::Status.eq(AccountStatus::Active))
            .lock_exclusive()
            .one(conn)
            .await?;
        Ok(account.map(|account| account.balance))
    }

    /// Writes a new balance for a row locked by [`Self::lock_active`].
    ///
    /// # Errors
    ///
    /// Returns `RecordNotUpdated` if no active row matched.
    pub async fn set_balance<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: AccountId,
        balance: Decimal,
    ) -> Result<(), DbErr> {
        let result = accounts::Entity::update_many()
            .col_expr(accounts::Column::Balance, Expr::value(balance))
            .col_expr(accounts::Column::UpdatedAt, Expr::cust("now()"))
            .filter(accounts::Column::Id.eq(id.into_inner()))
            .filter(accounts::Column::Status.eq(AccountStatus::Active))
            .exec(conn)
            .await?;

        if result.rows_affected != 1 {
            return Err(DbErr::RecordNotUpdated);
        }
        Ok(())
    }
}

/// Converts a stored row into the engine's balance-free view.
fn snapshot(model: accounts::Model) -> Result<AccountSnapshot, DbErr> {
    let currency = CurrencyCode::parse(model.currency.trim())
        .map_err(|e| DbErr::Type(format!("account {}: {e}", model.id)))?;

    Ok(AccountSnapshot {
        id: AccountId::from_uuid(model.id),
        owner_id: UserId::from_uuid(model.owner_id),
        number: model.number,
        currency,
        status: model.status.into(),
    })
}
