//! Validation of stock deltas against on-hand quantities.

use std::collections::BTreeMap;
use stockledger_shared::types::ItemCode;
use tracing::warn;

use crate::error::{LedgerError, LedgerResult};
use crate::model::Item;
use crate::stock::delta::StockDelta;

/// What to do when a delta references an item missing from the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingItemPolicy {
    /// Fail with `ItemNotFound` (new lines).
    Reject,
    /// Log and skip the item (reversing lines of a removed item).
    Skip,
}

/// A planned quantity change for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockAdjustment {
    /// The item.
    pub code: ItemCode,
    /// Quantity read in the transaction.
    pub before: i64,
    /// Quantity to persist.
    pub after: i64,
}

impl StockAdjustment {
    /// Signed change.
    #[must_use]
    pub fn change(&self) -> i64 {
        self.after - self.before
    }

    /// Writes the planned quantity onto the item record.
    pub fn apply_to(&self, item: &mut Item) {
        item.quantity = self.after;
    }
}

/// Stateless stock planner.
pub struct StockLedger;

impl StockLedger {
    /// Plans the quantity changes for a delta.
    ///
    /// Every resulting quantity is checked before anything is returned, so a
    /// failure leaves nothing to write. A decrement that would take an item
    /// below zero fails with `InsufficientStock`; increments always apply.
    pub fn plan(
        delta: &StockDelta,
        items: &BTreeMap<ItemCode, Item>,
        policy: MissingItemPolicy,
    ) -> LedgerResult<Vec<StockAdjustment>> {
        let mut adjustments = Vec::with_capacity(delta.len());

        for (code, change) in delta.iter() {
            let Some(item) = items.get(code) else {
                match policy {
                    MissingItemPolicy::Reject => return Err(LedgerError::ItemNotFound(code.clone())),
                    MissingItemPolicy::Skip => {
                        warn!(
                            item_code = %code,
                            change,
                            "Item no longer exists, skipping stock adjustment"
                        );
                        continue;
                    }
                }
            };

            let after = item.quantity.checked_add(change).ok_or_else(|| {
                LedgerError::Validation(format!("Stock quantity for item {code} overflows"))
            })?;

            if change < 0 && after < 0 {
                return Err(LedgerError::InsufficientStock {
                    item: code.clone(),
                    available: item.quantity,
                    requested: -change,
                    shortfall: -after,
                });
            }

            adjustments.push(StockAdjustment {
                code: code.clone(),
                before: item.quantity,
                after,
            });
        }

        Ok(adjustments)
    }
}
