//! Inputs and outcomes of engine operations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use stockledger_shared::types::AccountId;

use crate::balance::RecalculationReport;
use crate::model::{Actor, Movement, MovementKind, StockDirection};
use crate::stock::LineItemInput;

/// Requested lines of a line-itemed movement.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LineItemsInput {
    /// Whether the lines take stock out or bring it in.
    pub direction: StockDirection,
    /// Requested lines, at least one.
    pub lines: Vec<LineItemInput>,
}

/// Input for creating a movement.
#[derive(Debug, Clone)]
pub struct CreateMovementInput {
    /// Owning account.
    pub account_id: AccountId,
    /// Name for an account created on first use. Without it, a missing
    /// account (other than walk-in) is `AccountNotFound`.
    pub account_name: Option<String>,
    /// Sign of the movement.
    pub kind: MovementKind,
    /// Unsigned amount; must equal the line total when lines are present.
    pub amount: Decimal,
    /// Free-text description.
    pub description: String,
    /// Business timestamp; now when absent.
    pub timestamp: Option<DateTime<Utc>>,
    /// Lines for a stock-moving movement.
    pub lines: Option<LineItemsInput>,
    /// Caller key deduplicating retried creates.
    pub idempotency_key: Option<String>,
    /// Who is creating the movement.
    pub actor: Actor,
}

/// Input for editing a movement. Absent fields keep their current value.
#[derive(Debug, Clone)]
pub struct EditMovementInput {
    /// New kind.
    pub kind: Option<MovementKind>,
    /// New amount. For line-itemed movements it defaults to the new line total.
    pub amount: Option<Decimal>,
    /// New description.
    pub description: Option<String>,
    /// New lines; only valid for line-itemed movements.
    pub lines: Option<Vec<LineItemInput>>,
    /// Optional reason recorded in the audit trail.
    pub reason: Option<String>,
    /// Who is editing.
    pub actor: Actor,
}

/// Result of a create.
#[derive(Debug, Clone)]
pub struct CreateOutcome {
    /// The created (or deduplicated) movement.
    pub movement: Movement,
    /// True when an earlier create with the same idempotency key was found.
    pub deduplicated: bool,
    /// Present when the follow-up recalculation ran inline and succeeded.
    pub recalculation: Option<RecalculationReport>,
}

/// Result of a cancel.
#[derive(Debug, Clone)]
pub enum CancelOutcome {
    /// The movement was cancelled.
    Cancelled {
        /// The cancelled movement.
        movement: Movement,
        /// Follow-up recalculation, if it ran inline.
        recalculation: Option<RecalculationReport>,
    },
    /// The movement was already cancelled; nothing was written.
    AlreadyCancelled {
        /// The unchanged movement.
        movement: Movement,
    },
}

impl CancelOutcome {
    /// The movement after the operation.
    #[must_use]
    pub fn movement(&self) -> &Movement {
        match self {
            Self::Cancelled { movement, .. } | Self::AlreadyCancelled { movement } => movement,
        }
    }
}

/// Result of a restore.
#[derive(Debug, Clone)]
pub enum RestoreOutcome {
    /// The movement was restored.
    Restored {
        /// The restored movement.
        movement: Movement,
        /// Follow-up recalculation, if it ran inline.
        recalculation: Option<RecalculationReport>,
    },
    /// The movement was not cancelled; nothing was written.
    NotCancelled {
        /// The unchanged movement.
        movement: Movement,
    },
}

impl RestoreOutcome {
    /// The movement after the operation.
    #[must_use]
    pub fn movement(&self) -> &Movement {
        match self {
            Self::Restored { movement, .. } | Self::NotCancelled { movement } => movement,
        }
    }
}

/// Result of an edit.
#[derive(Debug, Clone)]
pub enum EditOutcome {
    /// A simple movement was edited in place.
    Modified {
        /// The modified movement.
        movement: Movement,
        /// Follow-up recalculation, if it ran inline.
        recalculation: Option<RecalculationReport>,
    },
    /// A line-itemed movement was cancelled and replaced.
    Replaced {
        /// The original, now cancelled and linked to its replacement.
        original: Movement,
        /// The new active movement.
        replacement: Movement,
        /// Follow-up recalculation, if it ran inline.
        recalculation: Option<RecalculationReport>,
    },
}

impl EditOutcome {
    /// The movement that now carries the edited values.
    #[must_use]
    pub fn current(&self) -> &Movement {
        match self {
            Self::Modified { movement, .. } => movement,
            Self::Replaced { replacement, .. } => replacement,
        }
    }
}
