//! Balance recalculation as a pure fold over an account's history.

pub mod replay;

#[cfg(test)]
mod replay_props;

pub use replay::{
    AccountBalanceUpdate, BalanceReplayer, MovementBalanceUpdate, RecalculationPlan,
    RecalculationReport,
};
