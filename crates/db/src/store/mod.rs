//! PostgreSQL implementation of the ledger store.
//!
//! Transactions run at REPEATABLE READ. Saves are guarded updates that
//! match on the record's `version`; a guard that matches no row, a
//! serialization failure, or a unique violation surfaces as
//! `LedgerError::CommitConflict`.

mod convert;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, IsolationLevel, QueryFilter, QueryOrder, TransactionTrait,
};
use stockledger_core::{
    Account, Item, LedgerError, LedgerResult, LedgerStore, LedgerTxn, Movement, MovementOrder,
};
use stockledger_shared::types::{AccountId, ItemCode, MovementId};
use tracing::debug;

use crate::entities::{accounts, items, movements};
use crate::error::map_db_err;

/// [`LedgerStore`] backed by a SeaORM connection pool.
#[derive(Debug, Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    /// Creates a store over an open connection.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl LedgerStore for SeaOrmStore {
    async fn begin(&self) -> LedgerResult<Box<dyn LedgerTxn>> {
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::RepeatableRead), None)
            .await
            .map_err(map_db_err)?;
        Ok(Box::new(SeaOrmTxn { txn }))
    }
}

struct SeaOrmTxn {
    txn: DatabaseTransaction,
}

fn ensure_updated(rows_affected: u64, record: &str, key: &dyn std::fmt::Display) -> LedgerResult<()> {
    if rows_affected == 0 {
        debug!(record, key = %key, "Version guard matched no row");
        return Err(LedgerError::CommitConflict);
    }
    Ok(())
}

#[async_trait]
impl LedgerTxn for SeaOrmTxn {
    async fn account(&mut self, id: AccountId) -> LedgerResult<Option<Account>> {
        let model = accounts::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(map_db_err)?;
        Ok(model.map(convert::account_from_model))
    }

    async fn insert_account(&mut self, account: &Account) -> LedgerResult<()> {
        if self.account(account.id).await?.is_some() {
            return Err(LedgerError::DuplicateAccount(account.id));
        }
        convert::account_active_model(account)
            .insert(&self.txn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn save_account(&mut self, account: &Account) -> LedgerResult<Account> {
        let next = account.version + 1;
        let mut model = convert::account_active_model(account);
        model.version = Set(next);

        let result = accounts::Entity::update_many()
            .set(model)
            .filter(accounts::Column::Id.eq(account.id.into_inner()))
            .filter(accounts::Column::Version.eq(account.version))
            .exec(&self.txn)
            .await
            .map_err(map_db_err)?;
        ensure_updated(result.rows_affected, "account", &account.id)?;

        Ok(Account {
            version: next,
            ..account.clone()
        })
    }

    async fn item(&mut self, code: &ItemCode) -> LedgerResult<Option<Item>> {
        items::Entity::find_by_id(code.as_str().to_string())
            .one(&self.txn)
            .await
            .map_err(map_db_err)?
            .map(convert::item_from_model)
            .transpose()
    }

    async fn insert_item(&mut self, item: &Item) -> LedgerResult<()> {
        if self.item(&item.code).await?.is_some() {
            return Err(LedgerError::DuplicateItem(item.code.clone()));
        }
        convert::item_active_model(item)
            .insert(&self.txn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn save_item(&mut self, item: &Item) -> LedgerResult<Item> {
        let next = item.version + 1;
        let mut model = convert::item_active_model(item);
        model.version = Set(next);

        let result = items::Entity::update_many()
            .set(model)
            .filter(items::Column::Code.eq(item.code.as_str()))
            .filter(items::Column::Version.eq(item.version))
            .exec(&self.txn)
            .await
            .map_err(map_db_err)?;
        ensure_updated(result.rows_affected, "item", &item.code)?;

        Ok(Item {
            version: next,
            ..item.clone()
        })
    }

    async fn delete_item(&mut self, code: &ItemCode) -> LedgerResult<bool> {
        let result = items::Entity::delete_by_id(code.as_str().to_string())
            .exec(&self.txn)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected > 0)
    }

    async fn movement(&mut self, id: MovementId) -> LedgerResult<Option<Movement>> {
        movements::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(map_db_err)?
            .map(convert::movement_from_model)
            .transpose()
    }

    async fn movement_by_idempotency_key(
        &mut self,
        account_id: AccountId,
        key: &str,
    ) -> LedgerResult<Option<Movement>> {
        movements::Entity::find()
            .filter(movements::Column::AccountId.eq(account_id.into_inner()))
            .filter(movements::Column::IdempotencyKey.eq(key))
            .one(&self.txn)
            .await
            .map_err(map_db_err)?
            .map(convert::movement_from_model)
            .transpose()
    }

    async fn movements_for_account(
        &mut self,
        account_id: AccountId,
        order: MovementOrder,
    ) -> LedgerResult<Vec<Movement>> {
        let query = movements::Entity::find()
            .filter(movements::Column::AccountId.eq(account_id.into_inner()));
        let query = match order {
            MovementOrder::Asc => query
                .order_by_asc(movements::Column::OccurredAt)
                .order_by_asc(movements::Column::Sequence),
            MovementOrder::Desc => query
                .order_by_desc(movements::Column::OccurredAt)
                .order_by_desc(movements::Column::Sequence),
        };
        query
            .all(&self.txn)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(convert::movement_from_model)
            .collect()
    }

    async fn movements_between(
        &mut self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> LedgerResult<Vec<Movement>> {
        movements::Entity::find()
            .filter(movements::Column::OccurredAt.gte(from))
            .filter(movements::Column::OccurredAt.lt(to))
            .order_by_asc(movements::Column::OccurredAt)
            .order_by_asc(movements::Column::Sequence)
            .all(&self.txn)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(convert::movement_from_model)
            .collect()
    }

    async fn insert_movement(&mut self, movement: Movement) -> LedgerResult<Movement> {
        let mut model = convert::movement_active_model(&movement)?;
        model.version = Set(0);
        let inserted = model.insert(&self.txn).await.map_err(map_db_err)?;
        convert::movement_from_model(inserted)
    }

    async fn save_movement(&mut self, movement: &Movement) -> LedgerResult<Movement> {
        let next = movement.version + 1;
        let mut model = convert::movement_active_model(movement)?;
        model.version = Set(next);

        let result = movements::Entity::update_many()
            .set(model)
            .filter(movements::Column::Id.eq(movement.id.into_inner()))
            .filter(movements::Column::Version.eq(movement.version))
            .exec(&self.txn)
            .await
            .map_err(map_db_err)?;
        ensure_updated(result.rows_affected, "movement", &movement.id)?;

        Ok(Movement {
            version: next,
            ..movement.clone()
        })
    }

    async fn commit(self: Box<Self>) -> LedgerResult<()> {
        self.txn.commit().await.map_err(map_db_err)
    }
}
