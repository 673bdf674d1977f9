//! Lifecycle actions and the decisions returned by the state machine.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::model::{Actor, CancellationInfo, ModificationInfo, Movement, MovementState, PriorSnapshot};

/// Operations that move a movement between lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleOperation {
    /// Void the movement.
    Cancel,
    /// Undo a cancel.
    Restore,
    /// Change amount, kind, description or lines.
    Edit,
}

impl LifecycleOperation {
    /// Returns the string representation of the operation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cancel => "cancel",
            Self::Restore => "restore",
            Self::Edit => "edit",
        }
    }
}

impl fmt::Display for LifecycleOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A validated state transition with its audit trail (who, when, why).
#[derive(Debug, Clone)]
pub enum LifecycleAction {
    /// Cancel the movement.
    Cancel {
        /// The new state (Cancelled).
        new_state: MovementState,
        /// Who cancelled it.
        cancelled_by: Actor,
        /// When it was cancelled.
        cancelled_at: DateTime<Utc>,
        /// Optional reason.
        reason: Option<String>,
    },
    /// Restore a cancelled movement.
    Restore {
        /// The new state (Restored).
        new_state: MovementState,
        /// Who restored it.
        restored_by: Actor,
        /// When it was restored.
        restored_at: DateTime<Utc>,
    },
    /// Edit a simple movement in place.
    Modify {
        /// The new state (Modified).
        new_state: MovementState,
        /// Who edited it.
        modified_by: Actor,
        /// When it was edited.
        modified_at: DateTime<Utc>,
        /// Optional reason.
        reason: Option<String>,
        /// Values before the edit.
        prior: PriorSnapshot,
    },
}

impl LifecycleAction {
    /// Returns the state resulting from this action.
    #[must_use]
    pub fn new_state(&self) -> MovementState {
        match self {
            Self::Cancel { new_state, .. }
            | Self::Restore { new_state, .. }
            | Self::Modify { new_state, .. } => *new_state,
        }
    }

    /// Writes the state and audit fields onto the movement.
    ///
    /// Field changes of an in-place edit are applied separately by the caller.
    pub fn apply_to(&self, movement: &mut Movement) {
        movement.state = self.new_state();
        match self {
            Self::Cancel {
                cancelled_by,
                cancelled_at,
                reason,
                ..
            } => {
                movement.cancellation = Some(CancellationInfo {
                    reason: reason.clone(),
                    cancelled_at: *cancelled_at,
                    cancelled_by: cancelled_by.clone(),
                });
            }
            Self::Restore { .. } => {
                movement.cancellation = None;
            }
            Self::Modify {
                modified_by,
                modified_at,
                reason,
                prior,
                ..
            } => {
                movement.modification = Some(ModificationInfo {
                    reason: reason.clone(),
                    modified_at: *modified_at,
                    modified_by: modified_by.clone(),
                    prior: prior.clone(),
                });
            }
        }
    }
}

/// Outcome of asking to cancel a movement.
#[derive(Debug, Clone)]
pub enum CancelDecision {
    /// Apply the cancel.
    Proceed(LifecycleAction),
    /// Nothing to do; reported to the caller as information.
    AlreadyCancelled,
}

/// Outcome of asking to restore a movement.
#[derive(Debug, Clone)]
pub enum RestoreDecision {
    /// Apply the restore.
    Proceed(LifecycleAction),
    /// Nothing to do; reported to the caller as information.
    NotCancelled,
}

/// How an edit must be carried out, chosen by the movement's shape.
#[derive(Debug, Clone)]
pub enum EditPolicy {
    /// Simple movement: update fields in place under a Modify action.
    InPlace(LifecycleAction),
    /// Line-itemed movement: cancel the original with this action and
    /// create a linked replacement in the same commit.
    CancelAndRecreate(LifecycleAction),
}
