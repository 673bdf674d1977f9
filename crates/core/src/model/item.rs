//! Stock-tracked catalogue items.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockledger_shared::types::ItemCode;

use crate::error::{LedgerError, LedgerResult};

/// A catalogue item whose `quantity` is derived from line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// External code (barcode).
    pub code: ItemCode,
    /// Display name.
    pub name: String,
    /// Units on hand.
    pub quantity: i64,
    /// Default unit price for sale lines.
    pub selling_price: Decimal,
    /// Last price paid to a supplier.
    pub last_cost_price: Option<Decimal>,
    /// Margin applied over cost, in percent.
    pub margin_percent: Option<Decimal>,
    /// Optimistic concurrency token.
    pub version: i64,
}

/// Input for registering a catalogue item with its initial stock.
#[derive(Debug, Clone, Deserialize)]
pub struct NewItem {
    /// External code (barcode).
    pub code: ItemCode,
    /// Display name.
    pub name: String,
    /// Initial units on hand.
    #[serde(default)]
    pub quantity: i64,
    /// Default unit price for sale lines.
    pub selling_price: Decimal,
    /// Last price paid to a supplier.
    #[serde(default)]
    pub last_cost_price: Option<Decimal>,
    /// Margin applied over cost, in percent.
    #[serde(default)]
    pub margin_percent: Option<Decimal>,
}

impl NewItem {
    /// Validates the input and builds the item record.
    pub fn into_item(self) -> LedgerResult<Item> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(LedgerError::Validation("Item name is required".to_string()));
        }
        if self.quantity < 0 {
            return Err(LedgerError::Validation(
                "Initial quantity cannot be negative".to_string(),
            ));
        }
        if self.selling_price.is_sign_negative() {
            return Err(LedgerError::Validation(
                "Selling price cannot be negative".to_string(),
            ));
        }
        if self.last_cost_price.is_some_and(|p| p.is_sign_negative()) {
            return Err(LedgerError::Validation(
                "Cost price cannot be negative".to_string(),
            ));
        }

        Ok(Item {
            code: self.code,
            name: name.to_string(),
            quantity: self.quantity,
            selling_price: self.selling_price,
            last_cost_price: self.last_cost_price,
            margin_percent: self.margin_percent,
            version: 0,
        })
    }
}
