//! `SeaORM` active enums mirroring the Postgres enum types.
//!
//! Conversions to and from the `corebank-core` domain enums live here so repositories
//! never match on raw strings.

use corebank_core::audit::AuditOutcome as CoreAuditOutcome;
use corebank_core::ledger::{
    AccountStatus as CoreAccountStatus, TransactionStatus as CoreTransactionStatus,
    TransactionType as CoreTransactionType,
};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_status")]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "frozen")]
    Frozen,
    #[sea_orm(string_value = "closed")]
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_type")]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    #[sea_orm(string_value = "checking")]
    Checking,
    #[sea_orm(string_value = "savings")]
    Savings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(
    rs_type = "String",
    db_type = "Enum",
    enum_name = "ledger_transaction_type"
)]
#[serde(rename_all = "snake_case")]
pub enum LedgerTransactionType {
    #[sea_orm(string_value = "transfer")]
    Transfer,
    #[sea_orm(string_value = "deposit")]
    Deposit,
    #[sea_orm(string_value = "withdrawal")]
    Withdrawal,
    #[sea_orm(string_value = "interest")]
    Interest,
    #[sea_orm(string_value = "fee")]
    Fee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(
    rs_type = "String",
    db_type = "Enum",
    enum_name = "ledger_transaction_status"
)]
#[serde(rename_all = "snake_case")]
pub enum LedgerTransactionStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "failed")]
    Failed,
    #[sea_orm(string_value = "reversed")]
    Reversed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "audit_outcome")]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    #[sea_orm(string_value = "success")]
    Success,
    #[sea_orm(string_value = "failure")]
    Failure,
}

impl From<AccountStatus> for CoreAccountStatus {
    fn from(status: AccountStatus) -> Self {
        match status {
            AccountStatus::Active => Self::Active,
            AccountStatus::Frozen => Self::Frozen,
            AccountStatus::Closed => Self::Closed,
        }
    }
}

impl From<CoreAccountStatus> for AccountStatus {
    fn from(status: CoreAccountStatus) -> Self {
        match status {
            CoreAccountStatus::Active => Self::Active,
            CoreAccountStatus::Frozen => Self::Frozen,
            CoreAccountStatus::Closed => Self::Closed,
        }
    }
}

impl From<CoreTransactionType> for LedgerTransactionType {
    fn from(kind: CoreTransactionType) -> Self {
        match kind {
            CoreTransactionType::Transfer => Self::Transfer,
            CoreTransactionType::Deposit => Self::Deposit,
            CoreTransactionType::Withdrawal => Self::Withdrawal,
            CoreTransactionType::Interest => Self::Interest,
            CoreTransactionType::Fee => Self::Fee,
        }
    }
}

impl From<LedgerTransactionType> for CoreTransactionType {
    fn from(kind: LedgerTransactionType) -> Self {
        match kind {
            LedgerTransactionType::Transfer => Self::Transfer,
            LedgerTransactionType::Deposit => Self::Deposit,
            LedgerTransactionType::Withdrawal => Self::Withdrawal,
            LedgerTransactionType::Interest => Self::Interest,
            LedgerTransactionType::Fee => Self::Fee,
        }
    }
}

impl From<LedgerTransactionStatus> for CoreTransactionStatus {
    fn from(status: LedgerTransactionStatus) -> Self {
        match status {
            LedgerTransactionStatus::Pending => Self::Pending,
            LedgerTransactionStatus::Completed => Self::Completed,
            LedgerTransactionStatus::Failed => Self::Failed,
            LedgerTransactionStatus::Reversed => Self::Reversed,
        }
    }
}

impl From<CoreAuditOutcome> for AuditOutcome {
    fn from(outcome: CoreAuditOutcome) -> Self {
        match outcome {
            CoreAuditOutcome::Success => Self::Success,
            CoreAuditOutcome::Failure => Self::Failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use sea_orm::Iterable;

    #[test]
    fn test_transaction_type_round_trip() {
        for kind in LedgerTransactionType::iter() {
            let core: CoreTransactionType = kind.into();
            assert_eq!(LedgerTransactionType::from(core), kind);
        }
    }

    #[test]
    fn test_account_status_round_trip() {
        for status in AccountStatus::iter() {
            let core: CoreAccountStatus = status.into();
            assert_eq!(AccountStatus::from(core), status);
        }
    }

    #[rstest]
    #[case(LedgerTransactionType::Transfer.to_value(), "transfer")]
    #[case(LedgerTransactionType::Withdrawal.to_value(), "withdrawal")]
    #[case(LedgerTransactionStatus::Completed.to_value(), "completed")]
    #[case(AccountStatus::Frozen.to_value(), "frozen")]
    #[case(AccountType::Savings.to_value(), "savings")]
    #[case(AuditOutcome::from(CoreAuditOutcome::Failure).to_value(), "failure")]
    fn test_db_string_values(#[case] value: String, #[case] expected: &str) {
        assert_eq!(value, expected);
    }
}
