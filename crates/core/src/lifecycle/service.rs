//! Lifecycle service for movement state transitions.
//!
//! This module validates cancel, restore and edit requests against the
//! movement's current state and returns the action to apply.

use chrono::Utc;

use crate::error::{LedgerError, LedgerResult};
use crate::lifecycle::types::{
    CancelDecision, EditPolicy, LifecycleAction, LifecycleOperation, RestoreDecision,
};
use crate::model::{Actor, Movement, MovementBody, MovementState};

/// Cancel reason recorded on a movement superseded by a line-itemed edit.
pub const REPLACED_BY_EDIT: &str = "Replaced by edit";

/// Stateless service for movement lifecycle transitions.
pub struct LifecycleService;

impl LifecycleService {
    /// Cancel a movement.
    ///
    /// # Returns
    /// * `CancelDecision::Proceed` from Active, Restored or Modified
    /// * `CancelDecision::AlreadyCancelled` if already Cancelled
    pub fn cancel(
        movement: &Movement,
        cancelled_by: Actor,
        reason: Option<String>,
    ) -> CancelDecision {
        match movement.state {
            MovementState::Cancelled => CancelDecision::AlreadyCancelled,
            MovementState::Active | MovementState::Restored | MovementState::Modified => {
                CancelDecision::Proceed(LifecycleAction::Cancel {
                    new_state: MovementState::Cancelled,
                    cancelled_by,
                    cancelled_at: Utc::now(),
                    reason: normalize_reason(reason),
                })
            }
        }
    }

    /// Restore a cancelled movement.
    ///
    /// # Returns
    /// * `Ok(RestoreDecision::Proceed)` if Cancelled
    /// * `Ok(RestoreDecision::NotCancelled)` otherwise
    /// * `Err(LedgerError::ReplacedMovement)` if an edit replaced it
    pub fn restore(movement: &Movement, restored_by: Actor) -> LedgerResult<RestoreDecision> {
        if movement.state != MovementState::Cancelled {
            return Ok(RestoreDecision::NotCancelled);
        }
        if movement.replaced_by.is_some() {
            return Err(LedgerError::ReplacedMovement(movement.id));
        }

        Ok(RestoreDecision::Proceed(LifecycleAction::Restore {
            new_state: MovementState::Restored,
            restored_by,
            restored_at: Utc::now(),
        }))
    }

    /// Decide how to edit a movement.
    ///
    /// Simple movements are modified in place; line-itemed movements are
    /// cancelled and recreated so their lines are never rewritten.
    ///
    /// # Returns
    /// * `Err(LedgerError::InvalidTransition)` if Cancelled or Modified
    pub fn edit(
        movement: &Movement,
        edited_by: Actor,
        reason: Option<String>,
    ) -> LedgerResult<EditPolicy> {
        if !Self::is_valid_transition(movement.state, LifecycleOperation::Edit) {
            return Err(LedgerError::InvalidTransition {
                from: movement.state,
                operation: LifecycleOperation::Edit,
            });
        }

        let reason = normalize_reason(reason);
        let now = Utc::now();
        match movement.body {
            MovementBody::Simple => Ok(EditPolicy::InPlace(LifecycleAction::Modify {
                new_state: MovementState::Modified,
                modified_by: edited_by,
                modified_at: now,
                reason,
                prior: movement.snapshot(),
            })),
            MovementBody::LineItemed { .. } => {
                let reason = match reason {
                    Some(reason) => format!("{REPLACED_BY_EDIT}: {reason}"),
                    None => REPLACED_BY_EDIT.to_string(),
                };
                Ok(EditPolicy::CancelAndRecreate(LifecycleAction::Cancel {
                    new_state: MovementState::Cancelled,
                    cancelled_by: edited_by,
                    cancelled_at: now,
                    reason: Some(reason),
                }))
            }
        }
    }

    /// Check whether an operation is allowed from a state.
    ///
    /// Valid transitions:
    /// - cancel from Active, Restored, Modified
    /// - restore from Cancelled
    /// - edit from Active, Restored
    #[must_use]
    pub fn is_valid_transition(from: MovementState, operation: LifecycleOperation) -> bool {
        matches!(
            (from, operation),
            (
                MovementState::Active | MovementState::Restored | MovementState::Modified,
                LifecycleOperation::Cancel
            ) | (MovementState::Cancelled, LifecycleOperation::Restore)
                | (
                    MovementState::Active | MovementState::Restored,
                    LifecycleOperation::Edit
                )
        )
    }
}

fn normalize_reason(reason: Option<String>) -> Option<String> {
    reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
}
