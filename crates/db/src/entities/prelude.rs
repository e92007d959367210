//! `SeaORM` entity prelude.

pub use super::accounts::Entity as Accounts;
pub use super::audit_logs::Entity as AuditLogs;
pub use super::ledger_transactions::Entity as LedgerTransactions;
