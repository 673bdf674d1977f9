//! Ledger error taxonomy.
//!
//! Every engine operation fails with a [`LedgerError`]. Rule violations are
//! raised before any write; only [`LedgerError::CommitConflict`] is retryable.

use rust_decimal::Decimal;
use stockledger_shared::types::{AccountId, ItemCode, MovementId};
use thiserror::Error;

use crate::lifecycle::LifecycleOperation;
use crate::model::MovementState;

/// Result type alias using `LedgerError`.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Generic input validation failure.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Movement amount must be strictly positive.
    #[error("Movement amount must be greater than zero")]
    NonPositiveAmount,

    /// A line-itemed movement needs at least one line.
    #[error("Line-itemed movement must have at least one line")]
    EmptyLineItems,

    /// Amount of a line-itemed movement must equal the sum of its lines.
    #[error("Movement amount {amount} does not match line total {lines_total}")]
    AmountMismatch {
        /// The declared amount.
        amount: Decimal,
        /// Sum of line totals.
        lines_total: Decimal,
    },

    // ========== Not Found ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Item not found.
    #[error("Item not found: {0}")]
    ItemNotFound(ItemCode),

    /// Movement not found.
    #[error("Movement not found: {0}")]
    MovementNotFound(MovementId),

    // ========== Catalogue Errors ==========
    /// Account is disabled and cannot receive movements.
    #[error("Account {0} is disabled")]
    AccountDisabled(AccountId),

    /// Account id already in use.
    #[error("Account {0} already exists")]
    DuplicateAccount(AccountId),

    /// Item code already in use.
    #[error("Item {0} already exists")]
    DuplicateItem(ItemCode),

    // ========== Stock Errors ==========
    /// Applying the stock delta would leave the item below zero.
    #[error(
        "Insufficient stock for item {item}: available {available}, requested {requested}, short by {shortfall}"
    )]
    InsufficientStock {
        /// The item that ran short.
        item: ItemCode,
        /// Units on hand before the operation.
        available: i64,
        /// Units the operation takes out (net).
        requested: i64,
        /// Missing units.
        shortfall: i64,
    },

    /// The account's running balance would leave the decimal range.
    #[error("Running balance of account {0} would overflow")]
    BalanceOverflow(AccountId),

    // ========== Lifecycle Errors ==========
    /// The movement's state does not allow the operation.
    #[error("Cannot {operation} a movement in state {from}")]
    InvalidTransition {
        /// Current state.
        from: MovementState,
        /// Attempted operation.
        operation: LifecycleOperation,
    },

    /// A movement cancelled by a cancel-and-recreate edit cannot come back.
    #[error("Movement {0} was replaced by an edit and cannot be restored")]
    ReplacedMovement(MovementId),

    // ========== Concurrency Errors ==========
    /// A concurrent writer changed a record read by this operation.
    #[error("Concurrent modification detected, please retry")]
    CommitConflict,

    // ========== Integrity Errors ==========
    /// Recalculation left persisted state that does not match the fold.
    #[error("Recalculation drift on account {account}: {detail}")]
    RecalculationDrift {
        /// The account being recalculated.
        account: AccountId,
        /// What did not match.
        detail: String,
    },

    /// Storage backend failure.
    #[error("Store error: {0}")]
    Store(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NonPositiveAmount => "NON_POSITIVE_AMOUNT",
            Self::EmptyLineItems => "EMPTY_LINE_ITEMS",
            Self::AmountMismatch { .. } => "AMOUNT_MISMATCH",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::ItemNotFound(_) => "ITEM_NOT_FOUND",
            Self::MovementNotFound(_) => "MOVEMENT_NOT_FOUND",
            Self::AccountDisabled(_) => "ACCOUNT_DISABLED",
            Self::DuplicateAccount(_) => "DUPLICATE_ACCOUNT",
            Self::DuplicateItem(_) => "DUPLICATE_ITEM",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::BalanceOverflow(_) => "BALANCE_OVERFLOW",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::ReplacedMovement(_) => "MOVEMENT_REPLACED",
            Self::CommitConflict => "COMMIT_CONFLICT",
            Self::RecalculationDrift { .. } => "RECALCULATION_DRIFT",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - rejected before any write
            Self::Validation(_)
            | Self::NonPositiveAmount
            | Self::EmptyLineItems
            | Self::AmountMismatch { .. }
            | Self::InvalidTransition { .. }
            | Self::ReplacedMovement(_) => 400,

            // 404 Not Found
            Self::AccountNotFound(_) | Self::ItemNotFound(_) | Self::MovementNotFound(_) => 404,

            // 409 Conflict
            Self::DuplicateAccount(_) | Self::DuplicateItem(_) | Self::CommitConflict => 409,

            // 422 Unprocessable - business rules
            Self::AccountDisabled(_)
            | Self::InsufficientStock { .. }
            | Self::BalanceOverflow(_) => 422,

            // 500 Internal Server Error
            Self::RecalculationDrift { .. } | Self::Store(_) => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::CommitConflict)
    }
}
