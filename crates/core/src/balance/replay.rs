//! Chronological replay of an account's movements.
//!
//! The replayer folds a point-in-time snapshot into the set of writes that
//! make the persisted `balance_after` values and account balance agree with
//! the history. It never touches the store.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use stockledger_shared::types::{AccountId, MovementId};

use crate::error::{LedgerError, LedgerResult};
use crate::model::{Account, Movement};

/// A corrected running balance for one movement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementBalanceUpdate {
    /// The movement.
    pub movement_id: MovementId,
    /// Stored value.
    pub previous: Decimal,
    /// Value produced by the fold.
    pub balance_after: Decimal,
}

/// A corrected account balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountBalanceUpdate {
    /// Stored value.
    pub previous: Decimal,
    /// Value produced by the fold.
    pub balance: Decimal,
}

/// Writes needed to bring an account in line with its history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecalculationPlan {
    /// The account.
    pub account_id: AccountId,
    /// Definitive balance.
    pub balance: Decimal,
    /// Movements whose stored running balance differs, in replay order.
    pub movement_updates: Vec<MovementBalanceUpdate>,
    /// Present when the stored account balance differs.
    pub account_update: Option<AccountBalanceUpdate>,
}

impl RecalculationPlan {
    /// Returns true when nothing needs writing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.movement_updates.is_empty() && self.account_update.is_none()
    }

    /// Number of records the plan writes.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.movement_updates.len() + usize::from(self.account_update.is_some())
    }

    /// Patches an in-memory snapshot with the planned values.
    ///
    /// Returns the indices of the patched movements.
    pub fn apply(&self, account: &mut Account, movements: &mut [Movement]) -> Vec<usize> {
        let index: HashMap<MovementId, usize> = movements
            .iter()
            .enumerate()
            .map(|(i, m)| (m.id, i))
            .collect();

        let mut patched = Vec::with_capacity(self.movement_updates.len());
        for update in &self.movement_updates {
            if let Some(&i) = index.get(&update.movement_id) {
                movements[i].balance_after = update.balance_after;
                patched.push(i);
            }
        }
        if let Some(update) = &self.account_update {
            account.balance = update.balance;
        }
        patched
    }

    /// Summary handed back to callers once the plan is committed.
    #[must_use]
    pub fn report(&self) -> RecalculationReport {
        RecalculationReport {
            account_id: self.account_id,
            balance: self.balance,
            movements_updated: self.movement_updates.len(),
            account_updated: self.account_update.is_some(),
        }
    }
}

/// Outcome of a committed recalculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecalculationReport {
    /// The account.
    pub account_id: AccountId,
    /// Definitive balance.
    pub balance: Decimal,
    /// Movements whose running balance was rewritten.
    pub movements_updated: usize,
    /// Whether the account balance was rewritten.
    pub account_updated: bool,
}

impl RecalculationReport {
    /// Number of records written.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.movements_updated + usize::from(self.account_updated)
    }
}

/// Stateless balance folder.
pub struct BalanceReplayer;

impl BalanceReplayer {
    /// Folds the account's movements in `(timestamp, sequence)` order.
    ///
    /// Cancelled movements contribute zero but still receive the running
    /// total at their position. Movements of other accounts are ignored.
    ///
    /// Fails with `BalanceOverflow` when a running total leaves the decimal
    /// range.
    pub fn replay(account: &Account, movements: &[Movement]) -> LedgerResult<RecalculationPlan> {
        let mut ordered: Vec<&Movement> = movements
            .iter()
            .filter(|m| m.account_id == account.id)
            .collect();
        ordered.sort_by_key(|m| (m.timestamp, m.sequence));

        let mut running = Decimal::ZERO;
        let mut movement_updates = Vec::new();
        for movement in ordered {
            running = running
                .checked_add(movement.contribution())
                .ok_or(LedgerError::BalanceOverflow(account.id))?;
            if movement.balance_after != running {
                movement_updates.push(MovementBalanceUpdate {
                    movement_id: movement.id,
                    previous: movement.balance_after,
                    balance_after: running,
                });
            }
        }

        let account_update = (account.balance != running).then_some(AccountBalanceUpdate {
            previous: account.balance,
            balance: running,
        });

        Ok(RecalculationPlan {
            account_id: account.id,
            balance: running,
            movement_updates,
            account_update,
        })
    }
}
