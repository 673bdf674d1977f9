//! Create, cancel, restore and edit.

use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use stockledger_shared::types::{AccountId, ItemCode, MovementId};
use tracing::{info, warn};

use crate::engine::types::{
    CancelOutcome, CreateMovementInput, CreateOutcome, EditMovementInput, EditOutcome,
    RestoreOutcome,
};
use crate::engine::{
    LedgerEngine, apply_stock, ensure_replayable, load_items, require_account, require_movement,
    stage_stock,
};
use crate::error::{LedgerError, LedgerResult};
use crate::lifecycle::{CancelDecision, EditPolicy, LifecycleAction, LifecycleService, RestoreDecision};
use crate::model::{Account, Actor, Movement, MovementBody, MovementState};
use crate::stock::{
    MissingItemPolicy, StockDelta, ensure_amount_matches, lines_total, resolve_lines,
};
use crate::store::LedgerTxn;

impl LedgerEngine {
    /// Creates a movement and applies its stock effect in one commit.
    ///
    /// A repeated idempotency key for the same account returns the earlier
    /// movement without writing anything.
    pub async fn create(&self, input: CreateMovementInput) -> LedgerResult<CreateOutcome> {
        ensure_positive(input.amount)?;
        let idempotency_key = input
            .idempotency_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        let mut txn = self.store.begin().await?;

        if let Some(key) = idempotency_key.as_deref()
            && let Some(existing) = txn.movement_by_idempotency_key(input.account_id, key).await?
        {
            info!(
                movement_id = %existing.id,
                idempotency_key = key,
                "Duplicate create, returning existing movement"
            );
            return Ok(CreateOutcome {
                movement: existing,
                deduplicated: true,
                recalculation: None,
            });
        }

        let account = self
            .ensure_account(txn.as_mut(), input.account_id, input.account_name.as_deref())
            .await?;

        let body = match input.lines {
            None => MovementBody::Simple,
            Some(request) => {
                let codes: BTreeSet<ItemCode> =
                    request.lines.iter().map(|l| l.item_code.clone()).collect();
                let items = load_items(txn.as_mut(), &codes).await?;
                let lines = resolve_lines(&request.lines, &items)?;
                ensure_amount_matches(input.amount, &lines)?;
                let body = MovementBody::line_itemed(request.direction, lines)?;
                let delta = StockDelta::for_body(&body)?;
                stage_stock(txn.as_mut(), &delta, &items, MissingItemPolicy::Reject).await?;
                body
            }
        };

        let movement = Movement {
            id: MovementId::new(),
            account_id: account.id,
            kind: input.kind,
            amount: input.amount,
            description: input.description.trim().to_string(),
            timestamp: input.timestamp.unwrap_or_else(Utc::now),
            sequence: 0,
            balance_after: Decimal::ZERO,
            actor: input.actor,
            body,
            state: MovementState::Active,
            cancellation: None,
            modification: None,
            replaces: None,
            replaced_by: None,
            idempotency_key,
            version: 0,
        };

        let movement = txn.insert_movement(movement).await?;
        txn.save_account(&account).await?;
        ensure_replayable(txn.as_mut(), &account).await?;
        txn.commit().await?;

        info!(
            movement_id = %movement.id,
            account_id = %movement.account_id,
            kind = %movement.kind,
            amount = %movement.amount,
            lines = movement.body.lines().len(),
            "Movement created"
        );

        let recalculation = self.after_mutation(movement.account_id).await;
        let movement = self.refreshed(movement, recalculation.is_some()).await;
        Ok(CreateOutcome {
            movement,
            deduplicated: false,
            recalculation,
        })
    }

    /// Cancels a movement and reverses its stock effect.
    ///
    /// Lines whose item was removed from the catalogue are skipped.
    pub async fn cancel(
        &self,
        id: MovementId,
        reason: Option<String>,
        actor: Actor,
    ) -> LedgerResult<CancelOutcome> {
        let mut txn = self.store.begin().await?;
        let mut movement = require_movement(txn.as_mut(), id).await?;

        let action = match LifecycleService::cancel(&movement, actor, reason) {
            CancelDecision::AlreadyCancelled => {
                info!(movement_id = %id, "Movement already cancelled");
                return Ok(CancelOutcome::AlreadyCancelled { movement });
            }
            CancelDecision::Proceed(action) => action,
        };

        let account = require_account(txn.as_mut(), movement.account_id).await?;
        let undo = StockDelta::for_body(&movement.body)?.inverse();
        apply_stock(txn.as_mut(), &undo, MissingItemPolicy::Skip).await?;

        action.apply_to(&mut movement);
        let movement = txn.save_movement(&movement).await?;
        txn.save_account(&account).await?;
        ensure_replayable(txn.as_mut(), &account).await?;
        txn.commit().await?;

        info!(
            movement_id = %movement.id,
            account_id = %movement.account_id,
            "Movement cancelled"
        );

        let recalculation = self.after_mutation(movement.account_id).await;
        let movement = self.refreshed(movement, recalculation.is_some()).await;
        Ok(CancelOutcome::Cancelled {
            movement,
            recalculation,
        })
    }

    /// Restores a cancelled movement and re-applies its stock effect.
    pub async fn restore(&self, id: MovementId, actor: Actor) -> LedgerResult<RestoreOutcome> {
        let mut txn = self.store.begin().await?;
        let mut movement = require_movement(txn.as_mut(), id).await?;

        let action = match LifecycleService::restore(&movement, actor)? {
            RestoreDecision::NotCancelled => {
                info!(movement_id = %id, state = %movement.state, "Movement is not cancelled");
                return Ok(RestoreOutcome::NotCancelled { movement });
            }
            RestoreDecision::Proceed(action) => action,
        };

        let account = require_account(txn.as_mut(), movement.account_id).await?;
        let redo = StockDelta::for_body(&movement.body)?;
        apply_stock(txn.as_mut(), &redo, MissingItemPolicy::Skip).await?;

        action.apply_to(&mut movement);
        let movement = txn.save_movement(&movement).await?;
        txn.save_account(&account).await?;
        ensure_replayable(txn.as_mut(), &account).await?;
        txn.commit().await?;

        info!(
            movement_id = %movement.id,
            account_id = %movement.account_id,
            "Movement restored"
        );

        let recalculation = self.after_mutation(movement.account_id).await;
        let movement = self.refreshed(movement, recalculation.is_some()).await;
        Ok(RestoreOutcome::Restored {
            movement,
            recalculation,
        })
    }

    /// Edits a movement.
    ///
    /// Simple movements change in place and become Modified. Line-itemed
    /// movements are cancelled and replaced by a linked movement at the same
    /// timestamp; stock is checked against the net effect of both halves.
    ///
    /// Amounts and prices compare by value, so an edit that only rescales
    /// them (`100` to `100.00`) changes nothing and is rejected.
    pub async fn edit(&self, id: MovementId, input: EditMovementInput) -> LedgerResult<EditOutcome> {
        if let Some(amount) = input.amount {
            ensure_positive(amount)?;
        }

        let mut txn = self.store.begin().await?;
        let original = require_movement(txn.as_mut(), id).await?;
        let policy = LifecycleService::edit(&original, input.actor.clone(), input.reason.clone())?;
        let account = require_account(txn.as_mut(), original.account_id).await?;

        match policy {
            EditPolicy::InPlace(action) => {
                self.edit_in_place(txn, account, original, &action, input)
                    .await
            }
            EditPolicy::CancelAndRecreate(action) => {
                self.edit_by_replacement(txn, account, original, &action, input)
                    .await
            }
        }
    }

    async fn edit_in_place(
        &self,
        mut txn: Box<dyn LedgerTxn>,
        account: Account,
        original: Movement,
        action: &LifecycleAction,
        input: EditMovementInput,
    ) -> LedgerResult<EditOutcome> {
        if input.lines.is_some() {
            return Err(LedgerError::Validation(
                "A simple movement cannot gain line items".to_string(),
            ));
        }

        let kind = input.kind.unwrap_or(original.kind);
        let amount = input.amount.unwrap_or(original.amount);
        let description = input
            .description
            .map_or_else(|| original.description.clone(), |d| d.trim().to_string());

        if kind == original.kind && amount == original.amount && description == original.description
        {
            return Err(LedgerError::Validation(
                "Edit does not change the movement".to_string(),
            ));
        }

        let mut movement = original;
        action.apply_to(&mut movement);
        movement.kind = kind;
        movement.amount = amount;
        movement.description = description;

        let movement = txn.save_movement(&movement).await?;
        txn.save_account(&account).await?;
        ensure_replayable(txn.as_mut(), &account).await?;
        txn.commit().await?;

        info!(
            movement_id = %movement.id,
            account_id = %movement.account_id,
            amount = %movement.amount,
            "Movement modified in place"
        );

        let recalculation = self.after_mutation(movement.account_id).await;
        let movement = self.refreshed(movement, recalculation.is_some()).await;
        Ok(EditOutcome::Modified {
            movement,
            recalculation,
        })
    }

    async fn edit_by_replacement(
        &self,
        mut txn: Box<dyn LedgerTxn>,
        account: Account,
        original: Movement,
        action: &LifecycleAction,
        input: EditMovementInput,
    ) -> LedgerResult<EditOutcome> {
        let Some(direction) = original.body.direction() else {
            return Err(LedgerError::Validation(
                "Movement has no line items to replace".to_string(),
            ));
        };

        let mut codes: BTreeSet<ItemCode> = original
            .body
            .lines()
            .iter()
            .map(|l| l.item_code.clone())
            .collect();
        if let Some(inputs) = &input.lines {
            codes.extend(inputs.iter().map(|l| l.item_code.clone()));
        }
        let items = load_items(txn.as_mut(), &codes).await?;

        let lines = match &input.lines {
            Some(inputs) => resolve_lines(inputs, &items)?,
            None => original.body.lines().to_vec(),
        };
        let amount = match input.amount {
            Some(amount) => amount,
            None => lines_total(&lines)?,
        };
        ensure_positive(amount)?;
        ensure_amount_matches(amount, &lines)?;

        let kind = input.kind.unwrap_or(original.kind);
        let description = input
            .description
            .map_or_else(|| original.description.clone(), |d| d.trim().to_string());

        if lines == original.body.lines()
            && amount == original.amount
            && kind == original.kind
            && description == original.description
        {
            return Err(LedgerError::Validation(
                "Edit does not change the movement".to_string(),
            ));
        }

        let body = MovementBody::line_itemed(direction, lines)?;
        let undo = StockDelta::for_body(&original.body)?.inverse();
        let net = undo.merge(&StockDelta::for_body(&body)?)?;
        let adjustments =
            stage_stock(txn.as_mut(), &net, &items, MissingItemPolicy::Skip).await?;

        let mut original = original;
        action.apply_to(&mut original);

        let replacement = Movement {
            id: MovementId::new(),
            account_id: original.account_id,
            kind,
            amount,
            description,
            timestamp: original.timestamp,
            sequence: 0,
            balance_after: Decimal::ZERO,
            actor: input.actor,
            body,
            state: MovementState::Active,
            cancellation: None,
            modification: None,
            replaces: Some(original.id),
            replaced_by: None,
            idempotency_key: None,
            version: 0,
        };
        let replacement = txn.insert_movement(replacement).await?;

        original.replaced_by = Some(replacement.id);
        let original = txn.save_movement(&original).await?;
        txn.save_account(&account).await?;
        ensure_replayable(txn.as_mut(), &account).await?;
        txn.commit().await?;

        info!(
            original_id = %original.id,
            replacement_id = %replacement.id,
            account_id = %original.account_id,
            stock_changes = adjustments.len(),
            "Movement replaced by edit"
        );

        let recalculation = self.after_mutation(original.account_id).await;
        let recalculated = recalculation.is_some();
        let original = self.refreshed(original, recalculated).await;
        let replacement = self.refreshed(replacement, recalculated).await;
        Ok(EditOutcome::Replaced {
            original,
            replacement,
            recalculation,
        })
    }

    /// Reads the account, creating it for walk-in ids or when a name is given.
    async fn ensure_account(
        &self,
        txn: &mut dyn LedgerTxn,
        id: AccountId,
        name: Option<&str>,
    ) -> LedgerResult<Account> {
        match txn.account(id).await? {
            Some(account) if !account.enabled => Err(LedgerError::AccountDisabled(id)),
            Some(account) => Ok(account),
            None => {
                let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
                    Some(name) => name.to_string(),
                    None if id.is_walk_in() => self.config.walk_in_account_name.clone(),
                    None => return Err(LedgerError::AccountNotFound(id)),
                };
                let account = Account::open(id, name, Utc::now());
                txn.insert_account(&account).await?;
                info!(account_id = %id, "Account created on first movement");
                Ok(account)
            }
        }
    }

    /// Re-reads a movement so callers see the recalculated running balance.
    async fn refreshed(&self, movement: Movement, recalculated: bool) -> Movement {
        if !recalculated {
            return movement;
        }
        match self.movement(movement.id).await {
            Ok(fresh) => fresh,
            Err(e) => {
                warn!(movement_id = %movement.id, error = %e, "Failed to re-read movement");
                movement
            }
        }
    }
}

fn ensure_positive(amount: Decimal) -> LedgerResult<()> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount);
    }
    Ok(())
}
