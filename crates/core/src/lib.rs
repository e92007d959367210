//! Core ledger logic for Corebank.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and balance arithmetic live here.
//!
//! # Modules
//!
//! - `ledger` - Money-movement validation, planning and failure taxonomy
//! - `audit` - Audit entry contract and sinks

pub mod audit;
pub mod ledger;
