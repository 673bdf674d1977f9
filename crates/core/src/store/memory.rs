//! In-process ledger store.
//!
//! Each transaction works on a private clone of the state and records the
//! version of every record it writes. Commit takes the lock once, verifies
//! those versions against the live state, and swaps the records in. The lock
//! is never held across an await.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use stockledger_shared::types::{AccountId, ItemCode, MovementId};
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::model::{Account, Item, Movement, MovementOrder};
use crate::store::{LedgerStore, LedgerTxn};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    accounts: HashMap<AccountId, Account>,
    items: BTreeMap<ItemCode, Item>,
    movements: HashMap<MovementId, Movement>,
}

impl MemoryState {
    fn version_of(&self, key: &RecordKey) -> Option<i64> {
        match key {
            RecordKey::Account(id) => self.accounts.get(id).map(|a| a.version),
            RecordKey::Item(code) => self.items.get(code).map(|i| i.version),
            RecordKey::Movement(id) => self.movements.get(id).map(|m| m.version),
        }
    }

    fn has_idempotency_key(&self, movement: &Movement) -> bool {
        let Some(key) = movement.idempotency_key.as_deref() else {
            return false;
        };
        self.movements.values().any(|m| {
            m.id != movement.id
                && m.account_id == movement.account_id
                && m.idempotency_key.as_deref() == Some(key)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum RecordKey {
    Account(AccountId),
    Item(ItemCode),
    Movement(MovementId),
}

/// Thread-safe in-memory [`LedgerStore`] with optimistic concurrency.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    sequence: Arc<AtomicI64>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock(state: &Mutex<MemoryState>) -> LedgerResult<MutexGuard<'_, MemoryState>> {
    state
        .lock()
        .map_err(|_| LedgerError::Store("memory store lock poisoned".to_string()))
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn begin(&self) -> LedgerResult<Box<dyn LedgerTxn>> {
        let working = lock(&self.state)?.clone();
        Ok(Box::new(MemoryTxn {
            live: Arc::clone(&self.state),
            sequence: Arc::clone(&self.sequence),
            working,
            expected: BTreeMap::new(),
        }))
    }
}

struct MemoryTxn {
    live: Arc<Mutex<MemoryState>>,
    sequence: Arc<AtomicI64>,
    working: MemoryState,
    /// Version of each written record in the snapshot; `None` if it was absent.
    expected: BTreeMap<RecordKey, Option<i64>>,
}

impl MemoryTxn {
    fn expect(&mut self, key: RecordKey) {
        let version = self.working.version_of(&key);
        self.expected.entry(key).or_insert(version);
    }

    fn check_version(&self, key: &RecordKey, version: i64) -> LedgerResult<()> {
        match self.working.version_of(key) {
            Some(current) if current == version => Ok(()),
            _ => Err(LedgerError::CommitConflict),
        }
    }
}

#[async_trait]
impl LedgerTxn for MemoryTxn {
    async fn account(&mut self, id: AccountId) -> LedgerResult<Option<Account>> {
        Ok(self.working.accounts.get(&id).cloned())
    }

    async fn insert_account(&mut self, account: &Account) -> LedgerResult<()> {
        if self.working.accounts.contains_key(&account.id) {
            return Err(LedgerError::DuplicateAccount(account.id));
        }
        self.expect(RecordKey::Account(account.id));
        self.working.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn save_account(&mut self, account: &Account) -> LedgerResult<Account> {
        let key = RecordKey::Account(account.id);
        self.check_version(&key, account.version)?;
        self.expect(key);
        let saved = Account {
            version: account.version + 1,
            ..account.clone()
        };
        self.working.accounts.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn item(&mut self, code: &ItemCode) -> LedgerResult<Option<Item>> {
        Ok(self.working.items.get(code).cloned())
    }

    async fn insert_item(&mut self, item: &Item) -> LedgerResult<()> {
        if self.working.items.contains_key(&item.code) {
            return Err(LedgerError::DuplicateItem(item.code.clone()));
        }
        self.expect(RecordKey::Item(item.code.clone()));
        self.working.items.insert(item.code.clone(), item.clone());
        Ok(())
    }

    async fn save_item(&mut self, item: &Item) -> LedgerResult<Item> {
        let key = RecordKey::Item(item.code.clone());
        self.check_version(&key, item.version)?;
        self.expect(key);
        let saved = Item {
            version: item.version + 1,
            ..item.clone()
        };
        self.working.items.insert(saved.code.clone(), saved.clone());
        Ok(saved)
    }

    async fn delete_item(&mut self, code: &ItemCode) -> LedgerResult<bool> {
        if !self.working.items.contains_key(code) {
            return Ok(false);
        }
        self.expect(RecordKey::Item(code.clone()));
        self.working.items.remove(code);
        Ok(true)
    }

    async fn movement(&mut self, id: MovementId) -> LedgerResult<Option<Movement>> {
        Ok(self.working.movements.get(&id).cloned())
    }

    async fn movement_by_idempotency_key(
        &mut self,
        account_id: AccountId,
        key: &str,
    ) -> LedgerResult<Option<Movement>> {
        Ok(self
            .working
            .movements
            .values()
            .find(|m| m.account_id == account_id && m.idempotency_key.as_deref() == Some(key))
            .cloned())
    }

    async fn movements_for_account(
        &mut self,
        account_id: AccountId,
        order: MovementOrder,
    ) -> LedgerResult<Vec<Movement>> {
        let mut movements: Vec<Movement> = self
            .working
            .movements
            .values()
            .filter(|m| m.account_id == account_id)
            .cloned()
            .collect();
        movements.sort_by_key(|m| (m.timestamp, m.sequence));
        if order == MovementOrder::Desc {
            movements.reverse();
        }
        Ok(movements)
    }

    async fn movements_between(
        &mut self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> LedgerResult<Vec<Movement>> {
        let mut movements: Vec<Movement> = self
            .working
            .movements
            .values()
            .filter(|m| m.timestamp >= from && m.timestamp < to)
            .cloned()
            .collect();
        movements.sort_by_key(|m| (m.timestamp, m.sequence));
        Ok(movements)
    }

    async fn insert_movement(&mut self, mut movement: Movement) -> LedgerResult<Movement> {
        if self.working.movements.contains_key(&movement.id)
            || self.working.has_idempotency_key(&movement)
        {
            return Err(LedgerError::CommitConflict);
        }
        movement.sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        movement.version = 0;
        self.expect(RecordKey::Movement(movement.id));
        self.working.movements.insert(movement.id, movement.clone());
        Ok(movement)
    }

    async fn save_movement(&mut self, movement: &Movement) -> LedgerResult<Movement> {
        let key = RecordKey::Movement(movement.id);
        self.check_version(&key, movement.version)?;
        self.expect(key);
        let saved = Movement {
            version: movement.version + 1,
            ..movement.clone()
        };
        self.working.movements.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn commit(self: Box<Self>) -> LedgerResult<()> {
        let Self {
            live: shared,
            mut working,
            expected,
            ..
        } = *self;
        let mut live = lock(&shared)?;

        for (key, version) in &expected {
            if live.version_of(key) != *version {
                debug!(?key, "Memory store commit conflict");
                return Err(LedgerError::CommitConflict);
            }
            if let (RecordKey::Movement(id), None) = (key, version)
                && working
                    .movements
                    .get(id)
                    .is_some_and(|m| live.has_idempotency_key(m))
            {
                return Err(LedgerError::CommitConflict);
            }
        }

        for key in expected.into_keys() {
            match key {
                RecordKey::Account(id) => match working.accounts.remove(&id) {
                    Some(account) => {
                        live.accounts.insert(id, account);
                    }
                    None => {
                        live.accounts.remove(&id);
                    }
                },
                RecordKey::Item(code) => match working.items.remove(&code) {
                    Some(item) => {
                        live.items.insert(code, item);
                    }
                    None => {
                        live.items.remove(&code);
                    }
                },
                RecordKey::Movement(id) => match working.movements.remove(&id) {
                    Some(movement) => {
                        live.movements.insert(id, movement);
                    }
                    None => {
                        live.movements.remove(&id);
                    }
                },
            }
        }
        Ok(())
    }
}
