//! Movement records and their lifecycle metadata.
//!
//! A movement is a signed monetary event on one account. Its shape is
//! either [`MovementBody::Simple`] or [`MovementBody::LineItemed`]; only the
//! latter touches stock.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use stockledger_shared::types::{AccountId, ActorId, ItemCode, MovementId};

use crate::error::{LedgerError, LedgerResult};

/// Direction of money relative to the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    /// Decreases the account balance (a sale on credit, a charge).
    Outflow,
    /// Increases the account balance (a payment received).
    Inflow,
}

impl MovementKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Outflow => "outflow",
            Self::Inflow => "inflow",
        }
    }

    /// Parses a kind from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "outflow" => Some(Self::Outflow),
            "inflow" => Some(Self::Inflow),
            _ => None,
        }
    }

    /// Applies the kind's sign to a positive amount.
    #[must_use]
    pub fn signed(self, amount: Decimal) -> Decimal {
        match self {
            Self::Outflow => -amount,
            Self::Inflow => amount,
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle state of a movement.
///
/// Valid transitions:
/// - Active → Cancelled (cancel)
/// - Active → Modified (in-place edit)
/// - Cancelled → Restored (restore)
/// - Restored → Cancelled | Modified
/// - Modified → Cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementState {
    /// Counts toward balance and stock.
    Active,
    /// Voided; contributes nothing.
    Cancelled,
    /// Un-cancelled; behaves like Active.
    Restored,
    /// Edited in place; prior values are snapshotted.
    Modified,
}

impl MovementState {
    /// Returns the string representation of the state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
            Self::Restored => "restored",
            Self::Modified => "modified",
        }
    }

    /// Parses a state from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(Self::Active),
            "cancelled" => Some(Self::Cancelled),
            "restored" => Some(Self::Restored),
            "modified" => Some(Self::Modified),
            _ => None,
        }
    }

    /// Returns true if movements in this state count toward balance and stock.
    #[must_use]
    pub fn is_effective(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

impl fmt::Display for MovementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a line-itemed movement takes stock out or brings it in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockDirection {
    /// Lines decrement stock.
    Sale,
    /// Lines increment stock.
    Purchase,
}

impl StockDirection {
    /// Returns the string representation of the direction.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sale => "sale",
            Self::Purchase => "purchase",
        }
    }

    /// Parses a direction from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sale" => Some(Self::Sale),
            "purchase" => Some(Self::Purchase),
            _ => None,
        }
    }

    /// Signed stock change for a positive line quantity.
    #[must_use]
    pub fn signed(self, quantity: i64) -> i64 {
        match self {
            Self::Sale => -quantity,
            Self::Purchase => quantity,
        }
    }
}

impl fmt::Display for StockDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordering for per-account listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementOrder {
    /// Oldest first.
    #[default]
    Asc,
    /// Newest first.
    Desc,
}

/// Who performed an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Actor identifier.
    pub id: ActorId,
    /// Display name at the time of the operation.
    pub name: String,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub fn new(id: ActorId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// One line of a line-itemed movement.
///
/// The item name is copied at write time so history survives catalogue removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Referenced item.
    pub item_code: ItemCode,
    /// Item name at write time.
    pub item_name: String,
    /// Units, always positive.
    pub quantity: i64,
    /// Price per unit.
    pub unit_price: Decimal,
    /// `quantity × unit_price`.
    pub line_total: Decimal,
}

impl LineItem {
    /// Builds a validated line, computing its total.
    pub fn new(
        item_code: ItemCode,
        item_name: String,
        quantity: i64,
        unit_price: Decimal,
    ) -> LedgerResult<Self> {
        if quantity <= 0 {
            return Err(LedgerError::Validation(format!(
                "Line quantity for item {item_code} must be positive"
            )));
        }
        if unit_price.is_sign_negative() && !unit_price.is_zero() {
            return Err(LedgerError::Validation(format!(
                "Unit price for item {item_code} cannot be negative"
            )));
        }
        let line_total = Decimal::from(quantity)
            .checked_mul(unit_price)
            .ok_or_else(|| {
                LedgerError::Validation(format!("Line total for item {item_code} overflows"))
            })?;

        Ok(Self {
            item_code,
            item_name,
            quantity,
            unit_price,
            line_total,
        })
    }
}

/// Shape of a movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum MovementBody {
    /// A plain monetary movement with no stock effect.
    Simple,
    /// A movement backed by item lines that move stock.
    LineItemed {
        /// Whether the lines take stock out or bring it in.
        direction: StockDirection,
        /// Ordered lines, never empty.
        lines: Vec<LineItem>,
    },
}

impl MovementBody {
    /// Builds a line-itemed body, rejecting empty line lists.
    pub fn line_itemed(direction: StockDirection, lines: Vec<LineItem>) -> LedgerResult<Self> {
        if lines.is_empty() {
            return Err(LedgerError::EmptyLineItems);
        }
        Ok(Self::LineItemed { direction, lines })
    }

    /// Returns the lines, empty for simple bodies.
    #[must_use]
    pub fn lines(&self) -> &[LineItem] {
        match self {
            Self::Simple => &[],
            Self::LineItemed { lines, .. } => lines,
        }
    }

    /// Returns the stock direction of a line-itemed body.
    #[must_use]
    pub fn direction(&self) -> Option<StockDirection> {
        match self {
            Self::Simple => None,
            Self::LineItemed { direction, .. } => Some(*direction),
        }
    }

    /// Returns true for line-itemed bodies.
    #[must_use]
    pub fn is_line_itemed(&self) -> bool {
        matches!(self, Self::LineItemed { .. })
    }
}

/// Pre-edit values of an in-place modified movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorSnapshot {
    /// Kind before the edit.
    pub kind: MovementKind,
    /// Amount before the edit.
    pub amount: Decimal,
    /// Description before the edit.
    pub description: String,
}

/// Audit data recorded by a cancel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationInfo {
    /// Optional free-text reason.
    pub reason: Option<String>,
    /// When the movement was cancelled.
    pub cancelled_at: DateTime<Utc>,
    /// Who cancelled it.
    pub cancelled_by: Actor,
}

/// Audit data recorded by an in-place edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModificationInfo {
    /// Optional free-text reason.
    pub reason: Option<String>,
    /// When the movement was edited.
    pub modified_at: DateTime<Utc>,
    /// Who edited it.
    pub modified_by: Actor,
    /// Values before the edit.
    pub prior: PriorSnapshot,
}

/// A movement record. Never physically deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    /// Movement identifier.
    pub id: MovementId,
    /// Owning account.
    pub account_id: AccountId,
    /// Sign of the movement.
    pub kind: MovementKind,
    /// Unsigned amount, always positive.
    pub amount: Decimal,
    /// Free-text description.
    pub description: String,
    /// Business timestamp used for ordering.
    pub timestamp: DateTime<Utc>,
    /// Insertion order assigned by the store; breaks timestamp ties.
    pub sequence: i64,
    /// Running account balance after this movement. Written only by
    /// recalculation; zero on a fresh row until it runs.
    pub balance_after: Decimal,
    /// Who created the movement.
    pub actor: Actor,
    /// Simple or line-itemed shape.
    pub body: MovementBody,
    /// Lifecycle state.
    pub state: MovementState,
    /// Present while the movement is cancelled.
    pub cancellation: Option<CancellationInfo>,
    /// Present once the movement has been edited in place.
    pub modification: Option<ModificationInfo>,
    /// The movement this one replaced through an edit.
    pub replaces: Option<MovementId>,
    /// The movement that replaced this one through an edit.
    pub replaced_by: Option<MovementId>,
    /// Caller-supplied key used to deduplicate create retries.
    pub idempotency_key: Option<String>,
    /// Optimistic concurrency token.
    pub version: i64,
}

impl Movement {
    /// Amount with the kind's sign applied.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.kind.signed(self.amount)
    }

    /// Contribution to the account balance; zero while cancelled.
    #[must_use]
    pub fn contribution(&self) -> Decimal {
        if self.state.is_effective() {
            self.signed_amount()
        } else {
            Decimal::ZERO
        }
    }

    /// Values captured before an in-place edit.
    #[must_use]
    pub fn snapshot(&self) -> PriorSnapshot {
        PriorSnapshot {
            kind: self.kind,
            amount: self.amount,
            description: self.description.clone(),
        }
    }
}
