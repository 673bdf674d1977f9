//! Customer accounts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockledger_shared::types::AccountId;

use crate::error::{LedgerError, LedgerResult};

/// A counterparty whose running balance is derived from its movements.
///
/// `balance` is written only by the recalculation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account identifier.
    pub id: AccountId,
    /// Display name.
    pub name: String,
    /// Sum of signed amounts of the non-cancelled movements.
    pub balance: Decimal,
    /// Disabled accounts reject new movements.
    pub enabled: bool,
    /// Optimistic concurrency token.
    pub version: i64,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Opens a zero-balance, enabled account.
    #[must_use]
    pub fn open(id: AccountId, name: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            balance: Decimal::ZERO,
            enabled: true,
            version: 0,
            created_at,
        }
    }
}

/// Input for registering an account explicitly.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    /// Caller-chosen id; a fresh one is generated when absent.
    pub id: Option<AccountId>,
    /// Display name.
    pub name: String,
}

impl NewAccount {
    /// Validates the input and returns the trimmed name.
    pub fn validated_name(&self) -> LedgerResult<String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(LedgerError::Validation("Account name is required".to_string()));
        }
        Ok(name.to_string())
    }
}
