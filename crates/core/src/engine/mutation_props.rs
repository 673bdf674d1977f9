//! Property-based tests for LedgerEngine over the in-memory store.
//!
//! Random create, cancel, restore and edit sequences; after every operation
//! the stored balances and stock levels must match the effective history.

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use rust_decimal::Decimal;
use std::sync::Arc;
use stockledger_shared::config::LedgerConfig;
use stockledger_shared::types::{AccountId, ActorId, ItemCode, MovementId};

use crate::balance::BalanceReplayer;
use crate::engine::{
    CreateMovementInput, EditMovementInput, EditOutcome, LedgerEngine, LineItemsInput,
};
use crate::error::{LedgerError, LedgerResult};
use crate::model::{Actor, Movement, MovementKind, MovementOrder, NewAccount, NewItem, StockDirection};
use crate::stock::LineItemInput;
use crate::store::MemoryStore;

const ITEMS: [&str; 3] = ["A", "B", "C"];
const INITIAL_STOCK: i64 = 6;

#[derive(Debug, Clone)]
enum Op {
    Payment { inflow: bool, cents: i64 },
    Lines { direction: StockDirection, item: usize, quantity: i64 },
    Cancel(usize),
    Restore(usize),
    EditAmount { target: usize, cents: i64 },
    EditLines { target: usize, item: usize, quantity: i64 },
}

fn arb_direction() -> impl Strategy<Value = StockDirection> {
    prop_oneof![Just(StockDirection::Sale), Just(StockDirection::Purchase)]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<bool>(), 1i64..50_000).prop_map(|(inflow, cents)| Op::Payment { inflow, cents }),
        (arb_direction(), 0..ITEMS.len(), 1i64..5)
            .prop_map(|(direction, item, quantity)| Op::Lines { direction, item, quantity }),
        any::<usize>().prop_map(Op::Cancel),
        any::<usize>().prop_map(Op::Restore),
        (any::<usize>(), 1i64..50_000).prop_map(|(target, cents)| Op::EditAmount { target, cents }),
        (any::<usize>(), 0..ITEMS.len(), 1i64..5)
            .prop_map(|(target, item, quantity)| Op::EditLines { target, item, quantity }),
    ]
}

fn code(index: usize) -> ItemCode {
    ItemCode::parse(ITEMS[index]).unwrap()
}

fn price() -> Decimal {
    Decimal::new(250, 2)
}

fn actor() -> Actor {
    Actor::new(ActorId::new(), "clerk")
}

fn pick(ids: &[MovementId], target: usize) -> Option<MovementId> {
    (!ids.is_empty()).then(|| ids[target % ids.len()])
}

/// Rule violations are expected outcomes of random input; anything else
/// fails the case.
fn tolerated<T>(result: LedgerResult<T>) -> Result<Option<T>, TestCaseError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(
            e @ (LedgerError::Store(_)
            | LedgerError::RecalculationDrift { .. }
            | LedgerError::CommitConflict),
        ) => Err(TestCaseError::fail(format!("unexpected error: {e}"))),
        Err(_) => Ok(None),
    }
}

async fn apply(
    engine: &LedgerEngine,
    account_id: AccountId,
    ids: &mut Vec<MovementId>,
    op: Op,
) -> Result<(), TestCaseError> {
    let base = CreateMovementInput {
        account_id,
        account_name: None,
        kind: MovementKind::Inflow,
        amount: Decimal::ZERO,
        description: String::new(),
        timestamp: None,
        lines: None,
        idempotency_key: None,
        actor: actor(),
    };
    let edit = EditMovementInput {
        kind: None,
        amount: None,
        description: None,
        lines: None,
        reason: None,
        actor: actor(),
    };

    match op {
        Op::Payment { inflow, cents } => {
            let kind = if inflow { MovementKind::Inflow } else { MovementKind::Outflow };
            let input = CreateMovementInput {
                kind,
                amount: Decimal::new(cents, 2),
                ..base
            };
            if let Some(outcome) = tolerated(engine.create(input).await)? {
                ids.push(outcome.movement.id);
            }
        }
        Op::Lines { direction, item, quantity } => {
            let kind = match direction {
                StockDirection::Sale => MovementKind::Outflow,
                StockDirection::Purchase => MovementKind::Inflow,
            };
            let input = CreateMovementInput {
                kind,
                amount: price() * Decimal::from(quantity),
                lines: Some(LineItemsInput {
                    direction,
                    lines: vec![LineItemInput {
                        item_code: code(item),
                        quantity,
                        unit_price: None,
                    }],
                }),
                ..base
            };
            if let Some(outcome) = tolerated(engine.create(input).await)? {
                ids.push(outcome.movement.id);
            }
        }
        Op::Cancel(target) => {
            if let Some(id) = pick(ids, target) {
                tolerated(engine.cancel(id, None, actor()).await)?;
            }
        }
        Op::Restore(target) => {
            if let Some(id) = pick(ids, target) {
                tolerated(engine.restore(id, actor()).await)?;
            }
        }
        Op::EditAmount { target, cents } => {
            if let Some(id) = pick(ids, target) {
                let input = EditMovementInput {
                    amount: Some(Decimal::new(cents, 2)),
                    ..edit
                };
                tolerated(engine.edit(id, input).await)?;
            }
        }
        Op::EditLines { target, item, quantity } => {
            if let Some(id) = pick(ids, target) {
                let input = EditMovementInput {
                    lines: Some(vec![LineItemInput {
                        item_code: code(item),
                        quantity,
                        unit_price: None,
                    }]),
                    ..edit
                };
                if let Some(EditOutcome::Replaced { replacement, .. }) =
                    tolerated(engine.edit(id, input).await)?
                {
                    ids.push(replacement.id);
                }
            }
        }
    }
    Ok(())
}

async fn check_invariants(engine: &LedgerEngine, account_id: AccountId) -> Result<(), TestCaseError> {
    let account = engine.account(account_id).await.unwrap();
    let movements = engine
        .list_by_account(account_id, MovementOrder::Asc)
        .await
        .unwrap();

    let effective: Decimal = movements.iter().map(Movement::contribution).sum();
    prop_assert_eq!(account.balance, effective);
    prop_assert!(BalanceReplayer::replay(&account, &movements).unwrap().is_empty());

    for index in 0..ITEMS.len() {
        let item_code = code(index);
        let net: i64 = movements
            .iter()
            .filter(|m| m.state.is_effective())
            .filter_map(|m| m.body.direction().map(|d| (d, m.body.lines())))
            .flat_map(|(direction, lines)| {
                lines
                    .iter()
                    .filter(|l| l.item_code == item_code)
                    .map(move |l| direction.signed(l.quantity))
            })
            .sum();
        let stored = engine.item(&item_code).await.unwrap().quantity;
        prop_assert_eq!(stored, INITIAL_STOCK + net, "item {}", item_code);
        prop_assert!(stored >= 0);
    }
    Ok(())
}

async fn run(ops: Vec<Op>) -> Result<(), TestCaseError> {
    let engine = LedgerEngine::new(Arc::new(MemoryStore::new()), LedgerConfig::default());
    let account = engine
        .register_account(NewAccount {
            id: None,
            name: "Ana".to_string(),
        })
        .await
        .unwrap();
    for (index, name) in ITEMS.iter().enumerate() {
        engine
            .register_item(NewItem {
                code: code(index),
                name: format!("Item {name}"),
                quantity: INITIAL_STOCK,
                selling_price: price(),
                last_cost_price: None,
                margin_percent: None,
            })
            .await
            .unwrap();
    }

    let mut ids = Vec::new();
    for op in ops {
        apply(&engine, account.id, &mut ids, op).await?;
        check_invariants(&engine, account.id).await?;
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// After every committed operation the account balance is the sum of
    /// effective contributions and each item holds its initial stock plus
    /// the effective purchase and sale deltas.
    #[test]
    fn prop_balance_and_stock_follow_effective_history(
        ops in prop::collection::vec(arb_op(), 1..30)
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(run(ops))?;
    }
}
