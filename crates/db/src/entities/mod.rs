//! `SeaORM` entity definitions.

pub mod prelude;

pub mod accounts;
pub mod audit_logs;
pub mod ledger_transactions;
pub mod sea_orm_active_enums;
