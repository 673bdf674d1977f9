//! Storage seam for the ledger engine.
//!
//! A [`LedgerStore`] hands out [`LedgerTxn`]s. Reads inside a transaction
//! observe one consistent snapshot; writes are staged and become visible
//! only on [`LedgerTxn::commit`]. Dropping a transaction discards it.
//!
//! `save_*` writes are optimistic: the record's `version` must equal the
//! stored one, otherwise the write (or the commit) fails with
//! `LedgerError::CommitConflict`. A successful save returns the record with
//! its version bumped.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use stockledger_shared::types::{AccountId, ItemCode, MovementId};

use crate::error::LedgerResult;
use crate::model::{Account, Item, Movement, MovementOrder};

pub use memory::MemoryStore;

/// Factory for ledger transactions.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Opens a transaction over a consistent snapshot.
    async fn begin(&self) -> LedgerResult<Box<dyn LedgerTxn>>;
}

/// One atomic unit of reads and writes.
#[async_trait]
pub trait LedgerTxn: Send {
    /// Reads an account.
    async fn account(&mut self, id: AccountId) -> LedgerResult<Option<Account>>;

    /// Inserts a new account. Fails with `DuplicateAccount` if the id exists.
    async fn insert_account(&mut self, account: &Account) -> LedgerResult<()>;

    /// Version-checked account update.
    async fn save_account(&mut self, account: &Account) -> LedgerResult<Account>;

    /// Reads an item.
    async fn item(&mut self, code: &ItemCode) -> LedgerResult<Option<Item>>;

    /// Inserts a new item. Fails with `DuplicateItem` if the code exists.
    async fn insert_item(&mut self, item: &Item) -> LedgerResult<()>;

    /// Version-checked item update.
    async fn save_item(&mut self, item: &Item) -> LedgerResult<Item>;

    /// Removes an item from the catalogue. Returns false if it did not exist.
    async fn delete_item(&mut self, code: &ItemCode) -> LedgerResult<bool>;

    /// Reads a movement.
    async fn movement(&mut self, id: MovementId) -> LedgerResult<Option<Movement>>;

    /// Finds the movement created for an account with an idempotency key.
    async fn movement_by_idempotency_key(
        &mut self,
        account_id: AccountId,
        key: &str,
    ) -> LedgerResult<Option<Movement>>;

    /// All movements of an account ordered by `(timestamp, sequence)`.
    async fn movements_for_account(
        &mut self,
        account_id: AccountId,
        order: MovementOrder,
    ) -> LedgerResult<Vec<Movement>>;

    /// All movements with `from <= timestamp < to`, ascending.
    async fn movements_between(
        &mut self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> LedgerResult<Vec<Movement>>;

    /// Inserts a movement and returns it with its assigned `sequence`.
    async fn insert_movement(&mut self, movement: Movement) -> LedgerResult<Movement>;

    /// Version-checked movement update.
    async fn save_movement(&mut self, movement: &Movement) -> LedgerResult<Movement>;

    /// Applies every staged write, or none.
    async fn commit(self: Box<Self>) -> LedgerResult<()>;
}
