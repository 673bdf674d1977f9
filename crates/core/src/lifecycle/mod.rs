//! Movement lifecycle state machine.
//!
//! # Modules
//!
//! - `types` - Lifecycle actions and decisions
//! - `service` - State transition logic

pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use service::{LifecycleService, REPLACED_BY_EDIT};
pub use types::{CancelDecision, EditPolicy, LifecycleAction, LifecycleOperation, RestoreDecision};
