//! Stock ledger: per-item quantity deltas derived from line items.
//!
//! # Modules
//!
//! - `delta` - Aggregated signed quantity changes
//! - `ledger` - Validation of deltas against on-hand stock
//! - `lines` - Resolution of requested lines against the catalogue

pub mod delta;
pub mod ledger;
pub mod lines;

#[cfg(test)]
mod ledger_props;

pub use delta::StockDelta;
pub use ledger::{MissingItemPolicy, StockAdjustment, StockLedger};
pub use lines::{LineItemInput, ensure_amount_matches, lines_total, resolve_lines};
