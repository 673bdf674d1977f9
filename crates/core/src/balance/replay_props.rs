//! Property-based tests for BalanceReplayer.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use stockledger_shared::types::{AccountId, ActorId, MovementId};

use crate::balance::replay::BalanceReplayer;
use crate::model::{Account, Actor, Movement, MovementBody, MovementKind, MovementState};

fn arb_state() -> impl Strategy<Value = MovementState> {
    prop_oneof![
        Just(MovementState::Active),
        Just(MovementState::Cancelled),
        Just(MovementState::Restored),
        Just(MovementState::Modified),
    ]
}

fn arb_kind() -> impl Strategy<Value = MovementKind> {
    prop_oneof![Just(MovementKind::Outflow), Just(MovementKind::Inflow)]
}

/// (kind, cents, state, minute offset, stored balance cents)
fn arb_history() -> impl Strategy<Value = Vec<(MovementKind, i64, MovementState, i64, i64)>> {
    prop::collection::vec(
        (arb_kind(), 1i64..1_000_000, arb_state(), 0i64..30, -1_000_000i64..1_000_000),
        0..40,
    )
}

fn build(
    account: &Account,
    history: &[(MovementKind, i64, MovementState, i64, i64)],
) -> Vec<Movement> {
    let base = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
    history
        .iter()
        .enumerate()
        .map(|(i, (kind, cents, state, minutes, stored))| Movement {
            id: MovementId::new(),
            account_id: account.id,
            kind: *kind,
            amount: Decimal::new(*cents, 2),
            description: String::new(),
            timestamp: base + Duration::minutes(*minutes),
            sequence: i64::try_from(i).unwrap(),
            balance_after: Decimal::new(*stored, 2),
            actor: Actor::new(ActorId::new(), "clerk"),
            body: MovementBody::Simple,
            state: *state,
            cancellation: None,
            modification: None,
            replaces: None,
            replaced_by: None,
            idempotency_key: None,
            version: 0,
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The definitive balance is the sum of non-cancelled signed amounts.
    #[test]
    fn prop_balance_is_sum_of_effective(history in arb_history(), stored in -1_000_000i64..1_000_000) {
        let mut account = Account::open(AccountId::new(), "Ana".into(), Utc::now());
        account.balance = Decimal::new(stored, 2);
        let movements = build(&account, &history);

        let expected: Decimal = movements
            .iter()
            .filter(|m| m.state != MovementState::Cancelled)
            .map(Movement::signed_amount)
            .sum();

        let plan = BalanceReplayer::replay(&account, &movements).unwrap();
        prop_assert_eq!(plan.balance, expected);
        prop_assert_eq!(plan.account_update.is_some(), account.balance != expected);
    }

    /// Applying a plan reaches a fixed point: the next replay is empty.
    #[test]
    fn prop_replay_is_idempotent(history in arb_history()) {
        let mut account = Account::open(AccountId::new(), "Ana".into(), Utc::now());
        let mut movements = build(&account, &history);

        let plan = BalanceReplayer::replay(&account, &movements).unwrap();
        plan.apply(&mut account, &mut movements);

        let second = BalanceReplayer::replay(&account, &movements).unwrap();
        prop_assert!(second.is_empty());
        prop_assert_eq!(second.writes(), 0);
    }

    /// Replay order does not depend on the order movements are supplied in.
    #[test]
    fn prop_replay_independent_of_input_order(history in arb_history()) {
        let account = Account::open(AccountId::new(), "Ana".into(), Utc::now());
        let movements = build(&account, &history);
        let mut reversed = movements.clone();
        reversed.reverse();

        prop_assert_eq!(
            BalanceReplayer::replay(&account, &movements).unwrap(),
            BalanceReplayer::replay(&account, &reversed).unwrap()
        );
    }

    /// The last movement in replay order carries the account balance.
    #[test]
    fn prop_last_running_balance_is_account_balance(history in arb_history()) {
        prop_assume!(!history.is_empty());
        let mut account = Account::open(AccountId::new(), "Ana".into(), Utc::now());
        let mut movements = build(&account, &history);
        let plan = BalanceReplayer::replay(&account, &movements).unwrap();
        plan.apply(&mut account, &mut movements);

        let last = movements
            .iter()
            .max_by_key(|m| (m.timestamp, m.sequence))
            .unwrap();
        prop_assert_eq!(last.balance_after, account.balance);
    }
}
