//! Ledger domain types for money movement.
//!
//! These types describe requests entering the engine and the account facts it needs to
//! validate them. None of them carry a balance: balances are only ever read under lock.

use std::collections::BTreeMap;

use corebank_shared::types::{AccountId, Amount, CurrencyCode, UserId};
use serde::{Deserialize, Serialize};

use super::error::LedgerError;
use super::validation;

/// Schema-less context attached to a ledger transaction. Never interpreted by the engine.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Ledger transaction classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Movement between two customer accounts.
    Transfer,
    /// Credit into an account from outside the ledger.
    Deposit,
    /// Debit out of an account to outside the ledger.
    Withdrawal,
    /// System-initiated interest credit.
    Interest,
    /// System-initiated fee debit.
    Fee,
}

impl TransactionType {
    /// Returns true if transactions of this type debit a source account.
    #[must_use]
    pub const fn has_source(self) -> bool {
        matches!(self, Self::Transfer | Self::Withdrawal | Self::Fee)
    }

    /// Returns true if transactions of this type credit a destination account.
    #[must_use]
    pub const fn has_destination(self) -> bool {
        matches!(self, Self::Transfer | Self::Deposit | Self::Interest)
    }

    /// Audit action label for operations of this type.
    #[must_use]
    pub const fn audit_action(self) -> &'static str {
        match self {
            Self::Transfer => "ledger.transfer",
            Self::Deposit => "ledger.deposit",
            Self::Withdrawal => "ledger.withdrawal",
            Self::Interest => "ledger.interest",
            Self::Fee => "ledger.fee",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Transfer => "transfer",
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::Interest => "interest",
            Self::Fee => "fee",
        };
        f.write_str(s)
    }
}

/// Ledger transaction status.
///
/// The engine only ever persists `Completed`. `Reversed` is set by a separate compensating
/// flow; `Pending` and `Failed` exist for the schema but no engine path writes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Recorded but not yet applied.
    Pending,
    /// Applied to balances.
    Completed,
    /// Attempt that did not apply.
    Failed,
    /// Compensated by a later transaction.
    Reversed,
}

/// Account lifecycle status. Only `Active` accounts can move money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Open for transactions.
    Active,
    /// Temporarily blocked by account management.
    Frozen,
    /// Permanently closed.
    Closed,
}

impl AccountStatus {
    /// Returns true if the account may be debited or credited.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// The authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    /// Authenticated user id.
    pub user_id: UserId,
}

impl Principal {
    /// Creates a principal for an authenticated user.
    #[must_use]
    pub const fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}

/// How a caller names an account: by id or by its human-readable number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRef {
    /// Opaque account id.
    Id(AccountId),
    /// Human-readable account number.
    Number(String),
}

impl std::fmt::Display for AccountRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Number(number) => f.write_str(number),
        }
    }
}

impl std::str::FromStr for AccountRef {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validation::parse_account_ref(s)
    }
}

impl From<AccountId> for AccountRef {
    fn from(id: AccountId) -> Self {
        Self::Id(id)
    }
}

/// Caller-supplied token that makes a request safe to resend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Validates a raw idempotency key.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdempotencyKey` if the key is malformed.
    pub fn parse(raw: impl Into<String>) -> Result<Self, LedgerError> {
        let raw = raw.into();
        validation::validate_idempotency_key(&raw)?;
        Ok(Self(raw))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for IdempotencyKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(raw).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Account facts from a non-locking read. Deliberately balance-free.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSnapshot {
    /// Account id.
    pub id: AccountId,
    /// Owning principal.
    pub owner_id: UserId,
    /// Human-readable account number.
    pub number: String,
    /// Account currency.
    pub currency: CurrencyCode,
    /// Lifecycle status at read time.
    pub status: AccountStatus,
}

/// Request to move money between two accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Account to debit; must belong to the principal.
    pub source: AccountRef,
    /// Account to credit.
    pub destination: AccountRef,
    /// Positive amount.
    pub amount: Amount,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Caller-supplied idempotency key.
    pub idempotency_key: IdempotencyKey,
    /// Opaque context stored with the transaction.
    #[serde(default)]
    pub metadata: Metadata,
}

/// Request touching a single account: deposit, withdrawal, interest or fee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostingRequest {
    /// Account to credit or debit.
    pub account: AccountRef,
    /// Positive amount.
    pub amount: Amount,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Caller-supplied idempotency key.
    pub idempotency_key: IdempotencyKey,
    /// Opaque context stored with the transaction.
    #[serde(default)]
    pub metadata: Metadata,
}

/// Filters for the account history query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryFilter {
    /// Inclusive lower bound on creation time.
    pub from: Option<chrono::DateTime<chrono::Utc>>,
    /// Exclusive upper bound on creation time.
    pub to: Option<chrono::DateTime<chrono::Utc>>,
    /// Restrict to one transaction type.
    pub transaction_type: Option<TransactionType>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_transaction_type_shape() {
        assert!(TransactionType::Transfer.has_source());
        assert!(TransactionType::Transfer.has_destination());
        assert!(!TransactionType::Deposit.has_source());
        assert!(TransactionType::Deposit.has_destination());
        assert!(TransactionType::Withdrawal.has_source());
        assert!(!TransactionType::Withdrawal.has_destination());
        assert!(!TransactionType::Interest.has_source());
        assert!(TransactionType::Fee.has_source());
        assert!(!TransactionType::Fee.has_destination());
    }

    #[test]
    fn test_transaction_type_serde() {
        assert_eq!(
            serde_json::to_string(&TransactionType::Withdrawal).unwrap(),
            "\"withdrawal\""
        );
        assert_eq!(TransactionType::Fee.to_string(), "fee");
        assert_eq!(TransactionType::Deposit.audit_action(), "ledger.deposit");
    }

    #[test]
    fn test_only_active_accounts_move_money() {
        assert!(AccountStatus::Active.is_active());
        assert!(!AccountStatus::Frozen.is_active());
        assert!(!AccountStatus::Closed.is_active());
    }

    #[test]
    fn test_transfer_request_deserialize() {
        let id = AccountId::new();
        let json = serde_json::json!({
            "source": { "id": id },
            "destination": { "number": "0012345678" },
            "amount": "250.00",
            "idempotency_key": "t1"
        });
        let request: TransferRequest = serde_json::from_value(json).unwrap();
        assert_eq!(request.source, AccountRef::Id(id));
        assert_eq!(request.destination, AccountRef::Number("0012345678".into()));
        assert_eq!(request.amount.value(), dec!(250));
        assert!(request.description.is_empty());
        assert!(request.metadata.is_empty());
    }

    #[test]
    fn test_request_rejects_bad_key_and_amount() {
        let bad_key = serde_json::json!({
            "account": { "number": "0012345678" },
            "amount": "10",
            "idempotency_key": ""
        });
        assert!(serde_json::from_value::<PostingRequest>(bad_key).is_err());

        let bad_amount = serde_json::json!({
            "account": { "number": "0012345678" },
            "amount": "-10",
            "idempotency_key": "k"
        });
        assert!(serde_json::from_value::<PostingRequest>(bad_amount).is_err());
    }
}
