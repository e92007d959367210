//! Shared types, errors, and configuration for Corebank.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Amount and currency types with decimal precision
//! - Pagination types for history queries
//! - Client-visible error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
