//! Audit entry types.

use chrono::{DateTime, Utc};
use corebank_shared::types::{AuditEventId, TransactionId, UserId};
use serde::{Deserialize, Serialize};

use crate::ledger::{LedgerError, Metadata};

/// Outcome recorded for an audited operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// The operation committed.
    Success,
    /// The operation was rejected or rolled back.
    Failure,
}

/// One business event correlated to a ledger transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Event id.
    pub id: AuditEventId,
    /// Correlated ledger transaction, absent when nothing was committed.
    pub transaction_id: Option<TransactionId>,
    /// Principal that triggered the operation.
    pub actor_id: UserId,
    /// Action label, e.g. `ledger.transfer`.
    pub action: String,
    /// Success or failure.
    pub outcome: AuditOutcome,
    /// Free-form context.
    pub metadata: Metadata,
    /// Time the event was produced.
    pub occurred_at: DateTime<Utc>,
}

impl AuditEntry {
    fn new(actor_id: UserId, action: &str, outcome: AuditOutcome) -> Self {
        Self {
            id: AuditEventId::new(),
            transaction_id: None,
            actor_id,
            action: action.to_string(),
            outcome,
            metadata: Metadata::new(),
            occurred_at: Utc::now(),
        }
    }

    /// Entry for a committed transaction.
    #[must_use]
    pub fn success(actor_id: UserId, action: &str, transaction_id: TransactionId) -> Self {
        let mut entry = Self::new(actor_id, action, AuditOutcome::Success);
        entry.transaction_id = Some(transaction_id);
        entry
    }

    /// Entry for a rejected or rolled-back attempt. Records the failure kind and message.
    #[must_use]
    pub fn failure(actor_id: UserId, action: &str, error: &LedgerError) -> Self {
        Self::new(actor_id, action, AuditOutcome::Failure)
            .with("failure_kind", error.kind().as_str())
            .with("error_code", error.error_code())
            .with("reason", error.to_string())
    }

    /// Adds one metadata field.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}
