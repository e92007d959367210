//! Audit sinks.

use async_trait::async_trait;
use thiserror::Error;

use super::types::{AuditEntry, AuditOutcome};

/// Errors returned by audit sinks.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The backing store rejected the write.
    #[error("Audit store error: {0}")]
    Store(String),

    /// The sink did not answer in time.
    #[error("Audit write timed out")]
    Timeout,
}

/// Write-only destination for audit entries.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Records one entry.
    async fn record(&self, entry: AuditEntry) -> Result<(), AuditError>;
}

/// Sink that emits entries as structured `tracing` events on the `audit` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, entry: AuditEntry) -> Result<(), AuditError> {
        let transaction_id = entry.transaction_id.map(|id| id.to_string());
        let metadata = serde_json::to_string(&entry.metadata)
            .map_err(|e| AuditError::Store(e.to_string()))?;

        match entry.outcome {
            AuditOutcome::Success => tracing::info!(
                target: "audit",
                event_id = %entry.id,
                actor_id = %entry.actor_id,
                action = %entry.action,
                transaction_id = transaction_id.as_deref(),
                metadata = %metadata,
                "audit success"
            ),
            AuditOutcome::Failure => tracing::warn!(
                target: "audit",
                event_id = %entry.id,
                actor_id = %entry.actor_id,
                action = %entry.action,
                metadata = %metadata,
                "audit failure"
            ),
        }

        Ok(())
    }
}
