//! Ledger error types.
//!
//! Every failure the engine can surface belongs to exactly one [`FailureKind`]. Messages
//! name accounts and references but never balances: if the authoritative check could not
//! run the caller gets a transient failure, not an estimate.

use corebank_shared::AppError;
use corebank_shared::types::{AccountId, AmountError, CurrencyCode, TransactionId};
use thiserror::Error;

/// Coarse classification of ledger failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Malformed or contradictory input; fix the request.
    Validation,
    /// The principal may not act on the account.
    Authorization,
    /// Account missing or not active.
    NotFound,
    /// Authoritative under-lock balance check failed.
    InsufficientFunds,
    /// Store-side failure; resend with the same idempotency key.
    Transient,
}

impl FailureKind {
    /// Stable label used in audit metadata and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Authorization => "authorization",
            Self::NotFound => "not_found",
            Self::InsufficientFunds => "insufficient_funds",
            Self::Transient => "transient",
        }
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Account reference is neither an account id nor a well-formed account number.
    #[error("Invalid account reference '{0}'")]
    InvalidReference(String),

    /// Idempotency key is empty, too long or contains disallowed characters.
    #[error("Invalid idempotency key: {0}")]
    InvalidIdempotencyKey(&'static str),

    /// Amount failed the boundary check.
    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    /// Description exceeds the stored length.
    #[error("Description must be at most {max} characters")]
    DescriptionTooLong {
        /// Maximum accepted length in characters.
        max: usize,
    },

    /// Source and destination are the same account.
    #[error("Source and destination accounts must differ")]
    SelfTransfer,

    /// Transfer between accounts of different currencies.
    #[error(
        "Currency mismatch: source account is {source_currency}, destination account is {destination_currency}"
    )]
    CurrencyMismatch {
        /// Currency of the source account.
        source_currency: CurrencyCode,
        /// Currency of the destination account.
        destination_currency: CurrencyCode,
    },

    /// Applying the amount would exceed the representable balance.
    #[error("Amount would overflow the balance of account {0}")]
    BalanceOverflow(AccountId),

    // ========== Authorization Errors ==========
    /// Account is not owned by the requesting principal.
    #[error("Account {0} does not belong to the requesting user")]
    NotAccountOwner(AccountId),

    // ========== Not-found Errors ==========
    /// No account matches the reference.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Account is missing or not active (frozen/closed).
    #[error("Account {0} is not available for transactions")]
    AccountUnavailable(AccountId),

    /// No ledger transaction visible to the principal has this id.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    // ========== Funds Errors ==========
    /// Locked balance is lower than the requested debit.
    #[error("Insufficient funds in account {0}")]
    InsufficientFunds(AccountId),

    // ========== Transient Errors ==========
    /// The unit of work did not finish before its deadline and was rolled back.
    #[error("Operation timed out and was rolled back; retry with the same idempotency key")]
    Timeout,

    /// Store failure (connection, lock timeout, commit). Nothing was applied.
    #[error("Storage unavailable: {0}; retry with the same idempotency key")]
    Store(String),
}

impl LedgerError {
    /// Returns the failure class of this error.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidReference(_)
            | Self::InvalidIdempotencyKey(_)
            | Self::InvalidAmount(_)
            | Self::DescriptionTooLong { .. }
            | Self::SelfTransfer
            | Self::CurrencyMismatch { .. }
            | Self::BalanceOverflow(_) => FailureKind::Validation,
            Self::NotAccountOwner(_) => FailureKind::Authorization,
            Self::AccountNotFound(_)
            | Self::AccountUnavailable(_)
            | Self::TransactionNotFound(_) => FailureKind::NotFound,
            Self::InsufficientFunds(_) => FailureKind::InsufficientFunds,
            Self::Timeout | Self::Store(_) => FailureKind::Transient,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidReference(_) => "INVALID_ACCOUNT_REFERENCE",
            Self::InvalidIdempotencyKey(_) => "INVALID_IDEMPOTENCY_KEY",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::DescriptionTooLong { .. } => "DESCRIPTION_TOO_LONG",
            Self::SelfTransfer => "SELF_TRANSFER",
            Self::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            Self::BalanceOverflow(_) => "BALANCE_OVERFLOW",
            Self::NotAccountOwner(_) => "NOT_ACCOUNT_OWNER",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountUnavailable(_) => "ACCOUNT_UNAVAILABLE",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::InsufficientFunds(_) => "INSUFFICIENT_FUNDS",
            Self::Timeout => "TIMEOUT",
            Self::Store(_) => "STORE_UNAVAILABLE",
        }
    }

    /// Returns true if resending the same request (same idempotency key) is safe and useful.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind(), FailureKind::Transient)
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err.kind() {
            FailureKind::Validation => Self::Validation(message),
            FailureKind::Authorization => Self::Forbidden(message),
            FailureKind::NotFound => Self::NotFound(message),
            FailureKind::InsufficientFunds => Self::BusinessRule(message),
            FailureKind::Transient => Self::Unavailable(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn usd() -> CurrencyCode {
        CurrencyCode::parse("USD").unwrap()
    }

    fn eur() -> CurrencyCode {
        CurrencyCode::parse("EUR").unwrap()
    }

    #[rstest]
    #[case(LedgerError::SelfTransfer, FailureKind::Validation)]
    #[case(LedgerError::InvalidReference("??".into()), FailureKind::Validation)]
    #[case(LedgerError::InvalidAmount(AmountError::NotPositive), FailureKind::Validation)]
    #[case(LedgerError::CurrencyMismatch { source_currency: usd(), destination_currency: eur() }, FailureKind::Validation)]
    #[case(LedgerError::NotAccountOwner(AccountId::new()), FailureKind::Authorization)]
    #[case(LedgerError::AccountNotFound("ACC-1".into()), FailureKind::NotFound)]
    #[case(LedgerError::AccountUnavailable(AccountId::new()), FailureKind::NotFound)]
    #[case(LedgerError::TransactionNotFound(TransactionId::new()), FailureKind::NotFound)]
    #[case(LedgerError::InsufficientFunds(AccountId::new()), FailureKind::InsufficientFunds)]
    #[case(LedgerError::Timeout, FailureKind::Transient)]
    #[case(LedgerError::Store("connection reset".into()), FailureKind::Transient)]
    fn test_failure_kinds(#[case] err: LedgerError, #[case] kind: FailureKind) {
        assert_eq!(err.kind(), kind);
        assert_eq!(err.is_retryable(), kind == FailureKind::Transient);
    }

    #[rstest]
    #[case(LedgerError::SelfTransfer, 400)]
    #[case(LedgerError::NotAccountOwner(AccountId::new()), 403)]
    #[case(LedgerError::AccountUnavailable(AccountId::new()), 404)]
    #[case(LedgerError::InsufficientFunds(AccountId::new()), 422)]
    #[case(LedgerError::Timeout, 503)]
    fn test_app_error_mapping(#[case] err: LedgerError, #[case] status: u16) {
        let app: AppError = err.into();
        assert_eq!(app.status_code(), status);
    }

    #[test]
    fn test_transient_maps_to_retryable_app_error() {
        let app: AppError = LedgerError::Store("commit failed".into()).into();
        assert!(app.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::CurrencyMismatch {
            source_currency: usd(),
            destination_currency: eur(),
        };
        assert_eq!(
            err.to_string(),
            "Currency mismatch: source account is USD, destination account is EUR"
        );
        assert_eq!(
            LedgerError::InvalidAmount(AmountError::NotPositive).to_string(),
            "Invalid amount: amount must be greater than zero"
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(LedgerError::SelfTransfer.error_code(), "SELF_TRANSFER");
        assert_eq!(
            LedgerError::InsufficientFunds(AccountId::new()).error_code(),
            "INSUFFICIENT_FUNDS"
        );
        assert_eq!(FailureKind::InsufficientFunds.as_str(), "insufficient_funds");
    }
}
