//! Money-movement logic for the ledger engine.
//!
//! This module implements everything about a transfer, deposit or withdrawal that can be
//! decided without touching the store:
//! - Domain types for requests, account snapshots and transaction classification
//! - The failure taxonomy surfaced to callers
//! - Pre-flight validation (references, keys, ownership, currency)
//! - Balance-leg planning in canonical lock order and the under-lock balance check

pub mod error;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod service_props;

pub use error::{FailureKind, LedgerError};
pub use service::{BalanceLeg, LedgerService, MAX_BALANCE, MovementPlan};
pub use types::{
    AccountRef, AccountSnapshot, AccountStatus, HistoryFilter, IdempotencyKey, Metadata,
    PostingRequest, Principal, TransactionStatus, TransactionType, TransferRequest,
};
