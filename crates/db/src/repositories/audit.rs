//! Audit repository: the `audit_logs` table as an [`AuditSink`].
//!
//! Writes happen on the shared connection pool, outside any ledger unit of work, so an audit
//! failure can never roll back a committed movement.

use async_trait::async_trait;
use corebank_core::audit::{AuditEntry, AuditError, AuditSink};
use corebank_shared::types::TransactionId;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, NotSet, QueryFilter, QueryOrder, Set,
};

use crate::entities::audit_logs;

/// Audit repository.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    db: DatabaseConnection,
}

impl AuditRepository {
    /// Creates a new audit repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists the entries correlated to a transaction, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<Vec<audit_logs::Model>, DbErr> {
        audit_logs::Entity::find()
            .filter(audit_logs::Column::TransactionId.eq(transaction_id.into_inner()))
            .order_by_asc(audit_logs::Column::OccurredAt)
            .all(&self.db)
            .await
    }
}

#[async_trait]
impl AuditSink for AuditRepository {
    async fn record(&self, entry: AuditEntry) -> Result<(), AuditError> {
        let metadata = serde_json::to_value(&entry.metadata)
            .map_err(|e| AuditError::Store(e.to_string()))?;

        let row = audit_logs::ActiveModel {
            id: Set(entry.id.into_inner()),
            transaction_id: Set(entry.transaction_id.map(TransactionId::into_inner)),
            actor_id: Set(entry.actor_id.into_inner()),
            action: Set(entry.action),
            outcome: Set(entry.outcome.into()),
            metadata: Set(metadata),
            occurred_at: Set(entry.occurred_at.into()),
            created_at: NotSet,
        };

        audit_logs::Entity::insert(row)
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| AuditError::Store(e.to_string()))?;
        Ok(())
    }
}
