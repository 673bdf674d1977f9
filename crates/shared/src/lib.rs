//! Shared identifiers, errors, and configuration for StockLedger.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for accounts, movements, actors, and item codes
//! - Transport-level error type
//! - Configuration management, including ledger engine tuning

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, LedgerConfig, RecalculationMode, RetryPolicy};
pub use error::{AppError, AppResult};
