//! Persisted record shapes: accounts, items and movements.

pub mod account;
pub mod item;
pub mod movement;

pub use account::{Account, NewAccount};
pub use item::{Item, NewItem};
pub use movement::{
    Actor, CancellationInfo, LineItem, ModificationInfo, Movement, MovementBody, MovementKind,
    MovementOrder, MovementState, PriorSnapshot, StockDirection,
};
