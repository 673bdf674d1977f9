//! Aggregated stock deltas.

use std::collections::BTreeMap;
use stockledger_shared::types::ItemCode;

use crate::error::{LedgerError, LedgerResult};
use crate::model::{LineItem, MovementBody, StockDirection};

/// Signed quantity change per item.
///
/// Keyed by a `BTreeMap` so deltas apply in a deterministic order. Items
/// whose net change is zero are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockDelta(BTreeMap<ItemCode, i64>);

impl StockDelta {
    /// Aggregates the lines of one movement.
    pub fn from_lines(direction: StockDirection, lines: &[LineItem]) -> LedgerResult<Self> {
        let mut delta = Self::default();
        for line in lines {
            delta.add(&line.item_code, direction.signed(line.quantity))?;
        }
        Ok(delta)
    }

    /// Stock effect of a movement body; empty for simple movements.
    pub fn for_body(body: &MovementBody) -> LedgerResult<Self> {
        match body {
            MovementBody::Simple => Ok(Self::default()),
            MovementBody::LineItemed { direction, lines } => Self::from_lines(*direction, lines),
        }
    }

    /// The delta that undoes this one.
    #[must_use]
    pub fn inverse(&self) -> Self {
        Self(
            self.0
                .iter()
                .map(|(code, change)| (code.clone(), change.saturating_neg()))
                .collect(),
        )
    }

    /// Net effect of applying `self` then `other`.
    pub fn merge(&self, other: &Self) -> LedgerResult<Self> {
        let mut merged = self.clone();
        for (code, change) in &other.0 {
            merged.add(code, *change)?;
        }
        Ok(merged)
    }

    /// Net change for an item, zero when untouched.
    #[must_use]
    pub fn get(&self, code: &ItemCode) -> i64 {
        self.0.get(code).copied().unwrap_or(0)
    }

    /// Iterates `(item, change)` pairs in item-code order.
    pub fn iter(&self) -> impl Iterator<Item = (&ItemCode, i64)> {
        self.0.iter().map(|(code, change)| (code, *change))
    }

    /// Returns true if no item changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of items that change.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    fn add(&mut self, code: &ItemCode, change: i64) -> LedgerResult<()> {
        let current = self.get(code);
        let next = current.checked_add(change).ok_or_else(|| {
            LedgerError::Validation(format!("Stock change for item {code} overflows"))
        })?;
        if next == 0 {
            self.0.remove(code);
        } else {
            self.0.insert(code.clone(), next);
        }
        Ok(())
    }
}
