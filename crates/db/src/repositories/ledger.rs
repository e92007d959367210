//! Ledger repository: append-mostly storage of committed money movements.
//!
//! Rows are only ever inserted as `completed`, inside the engine's unit of work. Everything
//! else here is a read.

use corebank_core::ledger::{HistoryFilter, IdempotencyKey, Metadata, MovementPlan, Principal};
use corebank_shared::types::{
    AccountId, Amount, CurrencyCode, PageRequest, PageResponse, TransactionId, UserId,
};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, NotSet,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::entities::{
    ledger_transactions,
    sea_orm_active_enums::{LedgerTransactionStatus, LedgerTransactionType},
};

/// A ledger row about to be written by the engine.
#[derive(Debug, Clone)]
pub struct NewLedgerTransaction {
    /// Caller-supplied idempotency key.
    pub idempotency_key: IdempotencyKey,
    /// Movement type.
    pub transaction_type: LedgerTransactionType,
    /// Amount moved.
    pub amount: Amount,
    /// Currency of the touched accounts.
    pub currency: CurrencyCode,
    /// Debited account.
    pub from_account_id: Option<AccountId>,
    /// Credited account.
    pub to_account_id: Option<AccountId>,
    /// Free-text description.
    pub description: String,
    /// Opaque caller context.
    pub metadata: Metadata,
    /// Principal that initiated the movement.
    pub initiated_by: UserId,
}

impl NewLedgerTransaction {
    /// Builds the row for a validated plan.
    #[must_use]
    pub fn from_plan(
        plan: &MovementPlan,
        principal: &Principal,
        idempotency_key: IdempotencyKey,
        description: String,
        metadata: Metadata,
    ) -> Self {
        Self {
            idempotency_key,
            transaction_type: plan.transaction_type.into(),
            amount: plan.amount,
            currency: plan.currency,
            from_account_id: plan.source,
            to_account_id: plan.destination,
            description,
            metadata,
            initiated_by: principal.user_id,
        }
    }
}

/// Ledger repository.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts a `completed` row on the caller's connection.
    ///
    /// `created_at` and `completed_at` come from the store clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails, including a unique violation on the
    /// idempotency key.
    pub async fn insert_completed<C: ConnectionTrait>(
        &self,
        conn: &C,
        row: NewLedgerTransaction,
    ) -> Result<TransactionId, DbErr> {
        let id = TransactionId::new();
        let metadata =
            serde_json::to_value(&row.metadata).map_err(|e| DbErr::Json(e.to_string()))?;

        let model = ledger_transactions::ActiveModel {
            id: Set(id.into_inner()),
            idempotency_key: Set(row.idempotency_key.as_str().to_string()),
            transaction_type: Set(row.transaction_type),
            status: Set(LedgerTransactionStatus::Completed),
            amount: Set(row.amount.value()),
            currency: Set(row.currency.to_string()),
            from_account_id: Set(row.from_account_id.map(AccountId::into_inner)),
            to_account_id: Set(row.to_account_id.map(AccountId::into_inner)),
            description: Set(row.description),
            metadata: Set(metadata),
            initiated_by: Set(row.initiated_by.into_inner()),
            created_at: NotSet,
            completed_at: NotSet,
        };

        ledger_transactions::Entity::insert(model)
            .exec_without_returning(conn)
            .await?;
        Ok(id)
    }

    /// Finds a transaction by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(
        &self,
        id: TransactionId,
    ) -> Result<Option<ledger_transactions::Model>, DbErr> {
        ledger_transactions::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
    }

    /// Finds the transaction committed under an idempotency key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_idempotency_key(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<ledger_transactions::Model>, DbErr> {
        ledger_transactions::Entity::find()
            .filter(ledger_transactions::Column::IdempotencyKey.eq(key.as_str()))
            .one(&self.db)
            .await
    }

    /// Lists transactions where the account is source or destination, newest first.
    ///
    /// `filter.from` is inclusive and `filter.to` exclusive.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_account(
        &self,
        account_id: AccountId,
        filter: &HistoryFilter,
        page: PageRequest,
    ) -> Result<PageResponse<ledger_transactions::Model>, DbErr> {
        let page = page.normalized();
        let account = account_id.into_inner();

        let mut query = ledger_transactions::Entity::find().filter(
            Condition::any()
                .add(ledger_transactions::Column::FromAccountId.eq(account))
                .add(ledger_transactions::Column::ToAccountId.eq(account)),
        );

        if let Some(from) = filter.from {
            query = query.filter(ledger_transactions::Column::CreatedAt.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(ledger_transactions::Column::CreatedAt.lt(to));
        }
        if let Some(kind) = filter.transaction_type {
            query = query.filter(
                ledger_transactions::Column::TransactionType.eq(LedgerTransactionType::from(kind)),
            );
        }

        let total = query.clone().count(&self.db).await?;

        let rows = query
            .order_by_desc(ledger_transactions::Column::CreatedAt)
            .order_by_desc(ledger_transactions::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(rows, page, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corebank_core::ledger::{AccountSnapshot, AccountStatus, LedgerService};
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_plan_copies_shape() {
        let owner = UserId::new();
        let account = AccountSnapshot {
            id: AccountId::new(),
            owner_id: owner,
            number: "ACC0000001".to_string(),
            currency: CurrencyCode::parse("EUR").unwrap(),
            status: AccountStatus::Active,
        };
        let plan = LedgerService::plan_withdrawal(
            &Principal::new(owner),
            &account,
            Amount::new(dec!(12.5)).unwrap(),
        )
        .unwrap();

        let mut metadata = Metadata::new();
        metadata.insert("channel".into(), "atm".into());
        let row = NewLedgerTransaction::from_plan(
            &plan,
            &Principal::new(owner),
            IdempotencyKey::parse("w-1").unwrap(),
            "cash".into(),
            metadata,
        );

        assert_eq!(row.transaction_type, LedgerTransactionType::Withdrawal);
        assert_eq!(row.from_account_id, Some(account.id));
        assert_eq!(row.to_account_id, None);
        assert_eq!(row.currency.as_str(), "EUR");
        assert_eq!(row.amount.value(), dec!(12.5));
        assert_eq!(row.initiated_by, owner);
        assert_eq!(row.metadata["channel"], "atm");
    }
}
