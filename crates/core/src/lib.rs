//! Core ledger consistency engine for StockLedger.
//!
//! This crate contains the business logic with ZERO web or database
//! dependencies. Balances and stock levels are derived from a history of
//! movements that can be cancelled, restored or edited after the fact.
//!
//! # Modules
//!
//! - `model` - Accounts, items and movements
//! - `stock` - Stock deltas and on-hand checks
//! - `lifecycle` - Movement state machine
//! - `balance` - Chronological balance replay
//! - `store` - Transactional storage seam and the in-memory store
//! - `engine` - Commit coordinator tying the above together

pub mod balance;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod stock;
pub mod store;

pub use balance::{BalanceReplayer, RecalculationPlan, RecalculationReport};
pub use engine::{
    CancelOutcome, CreateMovementInput, CreateOutcome, EditMovementInput, EditOutcome,
    LedgerEngine, LineItemsInput, RestoreOutcome,
};
pub use error::{LedgerError, LedgerResult};
pub use lifecycle::{LifecycleOperation, LifecycleService};
pub use model::{
    Account, Actor, Item, LineItem, Movement, MovementBody, MovementKind, MovementOrder,
    MovementState, NewAccount, NewItem, StockDirection,
};
pub use stock::{LineItemInput, StockDelta, StockLedger};
pub use store::{LedgerStore, LedgerTxn, MemoryStore};
