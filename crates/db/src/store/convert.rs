//! Conversions between entity rows and ledger records.

use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use serde::Serialize;
use stockledger_core::model::{CancellationInfo, ModificationInfo};
use stockledger_core::{
    Account, Actor, Item, LedgerError, LedgerResult, LineItem, Movement, MovementBody,
    MovementKind, MovementState, StockDirection,
};
use stockledger_shared::types::{AccountId, ActorId, ItemCode, MovementId};

use crate::entities::{accounts, items, movements};

pub(super) fn account_from_model(model: accounts::Model) -> Account {
    Account {
        id: AccountId::from_uuid(model.id),
        name: model.name,
        balance: model.balance,
        enabled: model.enabled,
        version: model.version,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub(super) fn account_active_model(account: &Account) -> accounts::ActiveModel {
    accounts::ActiveModel {
        id: Set(account.id.into_inner()),
        name: Set(account.name.clone()),
        balance: Set(account.balance),
        enabled: Set(account.enabled),
        version: Set(account.version),
        created_at: Set(account.created_at.into()),
    }
}

pub(super) fn item_from_model(model: items::Model) -> LedgerResult<Item> {
    let code = ItemCode::parse(&model.code)
        .ok_or_else(|| LedgerError::Store("Corrupt item row: blank code".to_string()))?;
    Ok(Item {
        code,
        name: model.name,
        quantity: model.quantity,
        selling_price: model.selling_price,
        last_cost_price: model.last_cost_price,
        margin_percent: model.margin_percent,
        version: model.version,
    })
}

pub(super) fn item_active_model(item: &Item) -> items::ActiveModel {
    items::ActiveModel {
        code: Set(item.code.as_str().to_string()),
        name: Set(item.name.clone()),
        quantity: Set(item.quantity),
        selling_price: Set(item.selling_price),
        last_cost_price: Set(item.last_cost_price),
        margin_percent: Set(item.margin_percent),
        version: Set(item.version),
    }
}

fn corrupt(id: MovementId, detail: impl std::fmt::Display) -> LedgerError {
    LedgerError::Store(format!("Corrupt movement row {id}: {detail}"))
}

fn to_json(value: &impl Serialize) -> LedgerResult<serde_json::Value> {
    serde_json::to_value(value)
        .map_err(|e| LedgerError::Store(format!("Failed to encode movement: {e}")))
}

pub(super) fn movement_from_model(model: movements::Model) -> LedgerResult<Movement> {
    let id = MovementId::from_uuid(model.id);
    let kind = MovementKind::parse(&model.kind)
        .ok_or_else(|| corrupt(id, format!("unknown kind {}", model.kind)))?;
    let state = MovementState::parse(&model.state)
        .ok_or_else(|| corrupt(id, format!("unknown state {}", model.state)))?;

    let body = match (model.direction, model.line_items) {
        (None, None) => MovementBody::Simple,
        (Some(direction), Some(lines)) => {
            let direction = StockDirection::parse(&direction)
                .ok_or_else(|| corrupt(id, format!("unknown direction {direction}")))?;
            let lines: Vec<LineItem> =
                serde_json::from_value(lines).map_err(|e| corrupt(id, e))?;
            MovementBody::line_itemed(direction, lines).map_err(|e| corrupt(id, e))?
        }
        _ => return Err(corrupt(id, "direction and line items must be set together")),
    };

    let cancellation = match (model.cancelled_at, model.cancelled_by_id) {
        (Some(cancelled_at), Some(by)) => Some(CancellationInfo {
            reason: model.cancel_reason,
            cancelled_at: cancelled_at.with_timezone(&Utc),
            cancelled_by: Actor::new(
                ActorId::from_uuid(by),
                model.cancelled_by_name.unwrap_or_default(),
            ),
        }),
        _ => None,
    };

    let modification = match (model.modified_at, model.modified_by_id, model.prior_snapshot) {
        (Some(modified_at), Some(by), Some(prior)) => Some(ModificationInfo {
            reason: model.modify_reason,
            modified_at: modified_at.with_timezone(&Utc),
            modified_by: Actor::new(
                ActorId::from_uuid(by),
                model.modified_by_name.unwrap_or_default(),
            ),
            prior: serde_json::from_value(prior).map_err(|e| corrupt(id, e))?,
        }),
        _ => None,
    };

    Ok(Movement {
        id,
        account_id: AccountId::from_uuid(model.account_id),
        kind,
        amount: model.amount,
        description: model.description,
        timestamp: model.occurred_at.with_timezone(&Utc),
        sequence: model.sequence,
        balance_after: model.balance_after,
        actor: Actor::new(ActorId::from_uuid(model.actor_id), model.actor_name),
        body,
        state,
        cancellation,
        modification,
        replaces: model.replaces.map(MovementId::from_uuid),
        replaced_by: model.replaced_by.map(MovementId::from_uuid),
        idempotency_key: model.idempotency_key,
        version: model.version,
    })
}

/// Builds a full active model. `sequence` is left to the database.
pub(super) fn movement_active_model(movement: &Movement) -> LedgerResult<movements::ActiveModel> {
    let (direction, line_items) = match &movement.body {
        MovementBody::Simple => (None, None),
        MovementBody::LineItemed { direction, lines } => {
            (Some(direction.as_str().to_string()), Some(to_json(lines)?))
        }
    };
    let cancellation = movement.cancellation.as_ref();
    let modification = movement.modification.as_ref();
    let prior_snapshot = modification.map(|m| to_json(&m.prior)).transpose()?;

    Ok(movements::ActiveModel {
        id: Set(movement.id.into_inner()),
        account_id: Set(movement.account_id.into_inner()),
        kind: Set(movement.kind.as_str().to_string()),
        amount: Set(movement.amount),
        description: Set(movement.description.clone()),
        occurred_at: Set(movement.timestamp.into()),
        sequence: NotSet,
        balance_after: Set(movement.balance_after),
        actor_id: Set(movement.actor.id.into_inner()),
        actor_name: Set(movement.actor.name.clone()),
        direction: Set(direction),
        line_items: Set(line_items),
        state: Set(movement.state.as_str().to_string()),
        cancel_reason: Set(cancellation.and_then(|c| c.reason.clone())),
        cancelled_at: Set(cancellation.map(|c| c.cancelled_at.into())),
        cancelled_by_id: Set(cancellation.map(|c| c.cancelled_by.id.into_inner())),
        cancelled_by_name: Set(cancellation.map(|c| c.cancelled_by.name.clone())),
        modify_reason: Set(modification.and_then(|m| m.reason.clone())),
        modified_at: Set(modification.map(|m| m.modified_at.into())),
        modified_by_id: Set(modification.map(|m| m.modified_by.id.into_inner())),
        modified_by_name: Set(modification.map(|m| m.modified_by.name.clone())),
        prior_snapshot: Set(prior_snapshot),
        replaces: Set(movement.replaces.map(MovementId::into_inner)),
        replaced_by: Set(movement.replaced_by.map(MovementId::into_inner)),
        idempotency_key: Set(movement.idempotency_key.clone()),
        version: Set(movement.version),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;
    use sea_orm::TryIntoModel;
    use stockledger_core::model::PriorSnapshot;

    fn actor(name: &str) -> Actor {
        Actor::new(ActorId::new(), name)
    }

    fn base() -> Movement {
        Movement {
            id: MovementId::new(),
            account_id: AccountId::new(),
            kind: MovementKind::Outflow,
            amount: dec!(100),
            description: "sale".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap(),
            sequence: 0,
            balance_after: dec!(-100),
            actor: actor("clerk"),
            body: MovementBody::Simple,
            state: MovementState::Active,
            cancellation: None,
            modification: None,
            replaces: None,
            replaced_by: None,
            idempotency_key: None,
            version: 2,
        }
    }

    fn stored(movement: &Movement, sequence: i64) -> movements::Model {
        let mut model = movement_active_model(movement).unwrap();
        model.sequence = Set(sequence);
        model.try_into_model().unwrap()
    }

    #[test]
    fn test_cancelled_line_itemed_movement_survives_storage() {
        let code = ItemCode::parse("A").unwrap();
        let line = LineItem::new(code, "Widget".to_string(), 2, dec!(50)).unwrap();
        let movement = Movement {
            body: MovementBody::line_itemed(StockDirection::Sale, vec![line]).unwrap(),
            state: MovementState::Cancelled,
            cancellation: Some(CancellationInfo {
                reason: Some("returned".to_string()),
                cancelled_at: Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
                cancelled_by: actor("manager"),
            }),
            replaced_by: Some(MovementId::new()),
            idempotency_key: Some("sale-1".to_string()),
            ..base()
        };

        let model = stored(&movement, 42);
        assert_eq!(model.direction.as_deref(), Some("sale"));
        assert_eq!(model.state, "cancelled");

        let restored = movement_from_model(model).unwrap();
        assert_eq!(restored, Movement { sequence: 42, ..movement });
    }

    #[test]
    fn test_modified_movement_keeps_prior_snapshot() {
        let original = base();
        let movement = Movement {
            amount: dec!(80),
            state: MovementState::Modified,
            modification: Some(ModificationInfo {
                reason: None,
                modified_at: original.timestamp + Duration::hours(1),
                modified_by: actor("manager"),
                prior: PriorSnapshot {
                    kind: original.kind,
                    amount: original.amount,
                    description: original.description.clone(),
                },
            }),
            ..original
        };

        let restored = movement_from_model(stored(&movement, 7)).unwrap();
        assert_eq!(restored.modification, movement.modification);
        assert_eq!(restored.body, MovementBody::Simple);
    }

    #[test]
    fn test_direction_without_lines_is_corrupt() {
        let mut model = stored(&base(), 1);
        model.direction = Some("sale".to_string());
        assert!(matches!(
            movement_from_model(model),
            Err(LedgerError::Store(_))
        ));
    }

    #[test]
    fn test_unknown_state_is_corrupt() {
        let mut model = stored(&base(), 1);
        model.state = "archived".to_string();
        assert!(matches!(
            movement_from_model(model),
            Err(LedgerError::Store(_))
        ));
    }
}
