//! Ledger engine: the commit coordinator.
//!
//! Every operation opens one store transaction, reads what it needs, runs
//! the lifecycle and stock checks, stages its writes and commits them
//! together. Mutations then trigger a recalculation of the owning account.
//!
//! # Modules
//!
//! - `types` - Operation inputs and outcomes
//! - `mutation` - Create, cancel, restore and edit
//! - `recalculate` - Balance recalculation and its trigger

pub mod mutation;
pub mod recalculate;
pub mod types;

#[cfg(test)]
mod mutation_props;

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use stockledger_shared::config::LedgerConfig;
use stockledger_shared::types::{AccountId, ItemCode, MovementId};
use tracing::{info, warn};

use crate::balance::BalanceReplayer;
use crate::error::{LedgerError, LedgerResult};
use crate::model::{Account, Item, Movement, MovementOrder, NewAccount, NewItem};
use crate::stock::{MissingItemPolicy, StockAdjustment, StockDelta, StockLedger};
use crate::store::{LedgerStore, LedgerTxn};

pub use types::{
    CancelOutcome, CreateMovementInput, CreateOutcome, EditMovementInput, EditOutcome,
    LineItemsInput, RestoreOutcome,
};

/// Coordinates ledger operations over a [`LedgerStore`].
///
/// Cheap to clone; clones share the store.
#[derive(Clone)]
pub struct LedgerEngine {
    store: Arc<dyn LedgerStore>,
    config: LedgerConfig,
}

impl fmt::Debug for LedgerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LedgerEngine {
    /// Creates an engine over a store.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    /// Engine configuration.
    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Registers an account with a zero balance.
    pub async fn register_account(&self, input: NewAccount) -> LedgerResult<Account> {
        let name = input.validated_name()?;
        let account = Account::open(input.id.unwrap_or_default(), name, Utc::now());

        let mut txn = self.store.begin().await?;
        if txn.account(account.id).await?.is_some() {
            return Err(LedgerError::DuplicateAccount(account.id));
        }
        txn.insert_account(&account).await?;
        txn.commit().await?;

        info!(account_id = %account.id, "Account registered");
        Ok(account)
    }

    /// Reads an account.
    pub async fn account(&self, id: AccountId) -> LedgerResult<Account> {
        let mut txn = self.store.begin().await?;
        require_account(txn.as_mut(), id).await
    }

    /// Adds an item to the catalogue with its initial stock.
    pub async fn register_item(&self, input: NewItem) -> LedgerResult<Item> {
        let item = input.into_item()?;

        let mut txn = self.store.begin().await?;
        if txn.item(&item.code).await?.is_some() {
            return Err(LedgerError::DuplicateItem(item.code));
        }
        txn.insert_item(&item).await?;
        txn.commit().await?;

        info!(item_code = %item.code, quantity = item.quantity, "Item registered");
        Ok(item)
    }

    /// Reads an item.
    pub async fn item(&self, code: &ItemCode) -> LedgerResult<Item> {
        let mut txn = self.store.begin().await?;
        txn.item(code)
            .await?
            .ok_or_else(|| LedgerError::ItemNotFound(code.clone()))
    }

    /// Removes an item from the catalogue.
    ///
    /// Movements keep the item's name on their lines. Cancelling or
    /// restoring them later skips the missing item's stock.
    pub async fn remove_item(&self, code: &ItemCode) -> LedgerResult<()> {
        let mut txn = self.store.begin().await?;
        if !txn.delete_item(code).await? {
            return Err(LedgerError::ItemNotFound(code.clone()));
        }
        txn.commit().await?;

        info!(item_code = %code, "Item removed from catalogue");
        Ok(())
    }

    /// Reads a movement.
    pub async fn movement(&self, id: MovementId) -> LedgerResult<Movement> {
        let mut txn = self.store.begin().await?;
        require_movement(txn.as_mut(), id).await
    }

    /// Lists an account's movements by `(timestamp, sequence)`.
    pub async fn list_by_account(
        &self,
        account_id: AccountId,
        order: MovementOrder,
    ) -> LedgerResult<Vec<Movement>> {
        let mut txn = self.store.begin().await?;
        require_account(txn.as_mut(), account_id).await?;
        txn.movements_for_account(account_id, order).await
    }

    /// Lists movements of every account with `from <= timestamp < to`.
    pub async fn list_by_time_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> LedgerResult<Vec<Movement>> {
        if from > to {
            return Err(LedgerError::Validation(
                "Time range start must not be after its end".to_string(),
            ));
        }
        let mut txn = self.store.begin().await?;
        txn.movements_between(from, to).await
    }

    /// Runs `operation`, retrying on `CommitConflict` with the configured
    /// exponential backoff.
    ///
    /// Intended for idempotent operations. Create is never retried here;
    /// callers retry it with an idempotency key.
    pub async fn with_retry<T, F, Fut>(&self, mut operation: F) -> LedgerResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = LedgerResult<T>>,
    {
        let policy = self.config.retry;
        let mut attempt = 1;
        loop {
            match operation().await {
                Err(e) if e.is_retryable() && attempt < policy.max_attempts => {
                    let delay = policy.delay_for(attempt);
                    warn!(
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "Commit conflict, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

async fn require_account(txn: &mut dyn LedgerTxn, id: AccountId) -> LedgerResult<Account> {
    txn.account(id)
        .await?
        .ok_or(LedgerError::AccountNotFound(id))
}

async fn require_movement(txn: &mut dyn LedgerTxn, id: MovementId) -> LedgerResult<Movement> {
    txn.movement(id)
        .await?
        .ok_or(LedgerError::MovementNotFound(id))
}

/// Folds the account's history as staged in `txn`.
///
/// Run before every commit that changes a contribution, so a write whose
/// running balance would overflow is rejected instead of committed.
async fn ensure_replayable(txn: &mut dyn LedgerTxn, account: &Account) -> LedgerResult<()> {
    let movements = txn
        .movements_for_account(account.id, MovementOrder::Asc)
        .await?;
    BalanceReplayer::replay(account, &movements)
        .inspect_err(|e| warn!(account_id = %account.id, error = %e, "Mutation rejected by replay"))
        .map(|_| ())
}

/// Reads the catalogue entries for `codes`; missing items are left out.
async fn load_items(
    txn: &mut dyn LedgerTxn,
    codes: &BTreeSet<ItemCode>,
) -> LedgerResult<BTreeMap<ItemCode, Item>> {
    let mut items = BTreeMap::new();
    for code in codes {
        if let Some(item) = txn.item(code).await? {
            items.insert(code.clone(), item);
        }
    }
    Ok(items)
}

/// Plans `delta` against `items` and stages the resulting item writes.
async fn stage_stock(
    txn: &mut dyn LedgerTxn,
    delta: &StockDelta,
    items: &BTreeMap<ItemCode, Item>,
    policy: MissingItemPolicy,
) -> LedgerResult<Vec<StockAdjustment>> {
    let adjustments = StockLedger::plan(delta, items, policy)?;
    for adjustment in &adjustments {
        if let Some(item) = items.get(&adjustment.code) {
            let mut item = item.clone();
            adjustment.apply_to(&mut item);
            txn.save_item(&item).await?;
        }
    }
    Ok(adjustments)
}

/// Loads the items touched by `delta`, then stages it.
async fn apply_stock(
    txn: &mut dyn LedgerTxn,
    delta: &StockDelta,
    policy: MissingItemPolicy,
) -> LedgerResult<Vec<StockAdjustment>> {
    if delta.is_empty() {
        return Ok(Vec::new());
    }
    let codes: BTreeSet<ItemCode> = delta.iter().map(|(code, _)| code.clone()).collect();
    let items = load_items(txn, &codes).await?;
    stage_stock(txn, delta, &items, policy).await
}
