//! Resolution of requested lines against the item catalogue.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use stockledger_shared::types::ItemCode;

use crate::error::{LedgerError, LedgerResult};
use crate::model::{Item, LineItem};

/// A requested line before it is priced and named from the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LineItemInput {
    /// Referenced item.
    pub item_code: ItemCode,
    /// Units, must be positive.
    pub quantity: i64,
    /// Price per unit; the item's selling price when absent.
    #[serde(default)]
    pub unit_price: Option<Decimal>,
}

/// Builds validated lines, copying names and default prices from `items`.
pub fn resolve_lines(
    inputs: &[LineItemInput],
    items: &BTreeMap<ItemCode, Item>,
) -> LedgerResult<Vec<LineItem>> {
    if inputs.is_empty() {
        return Err(LedgerError::EmptyLineItems);
    }

    inputs
        .iter()
        .map(|input| {
            let item = items
                .get(&input.item_code)
                .ok_or_else(|| LedgerError::ItemNotFound(input.item_code.clone()))?;
            LineItem::new(
                input.item_code.clone(),
                item.name.clone(),
                input.quantity,
                input.unit_price.unwrap_or(item.selling_price),
            )
        })
        .collect()
}

/// Sum of line totals.
pub fn lines_total(lines: &[LineItem]) -> LedgerResult<Decimal> {
    lines.iter().try_fold(Decimal::ZERO, |acc, line| {
        acc.checked_add(line.line_total)
            .ok_or_else(|| LedgerError::Validation("Line totals overflow".to_string()))
    })
}

/// Checks that a line-itemed movement's amount equals its lines.
pub fn ensure_amount_matches(amount: Decimal, lines: &[LineItem]) -> LedgerResult<()> {
    let total = lines_total(lines)?;
    if amount != total {
        return Err(LedgerError::AmountMismatch {
            amount,
            lines_total: total,
        });
    }
    Ok(())
}
