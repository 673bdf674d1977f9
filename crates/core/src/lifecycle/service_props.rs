//! Property-based tests for LifecycleService.

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use stockledger_shared::types::{AccountId, ActorId, ItemCode, MovementId};
use uuid::Uuid;

use crate::error::LedgerError;
use crate::lifecycle::service::LifecycleService;
use crate::lifecycle::types::{CancelDecision, EditPolicy, LifecycleOperation, RestoreDecision};
use crate::model::{
    Actor, LineItem, Movement, MovementBody, MovementKind, MovementState, StockDirection,
};

fn arb_state() -> impl Strategy<Value = MovementState> {
    prop_oneof![
        Just(MovementState::Active),
        Just(MovementState::Cancelled),
        Just(MovementState::Restored),
        Just(MovementState::Modified),
    ]
}

fn arb_actor() -> impl Strategy<Value = Actor> {
    (any::<u128>(), "[a-z]{1,12}")
        .prop_map(|(id, name)| Actor::new(ActorId::from_uuid(Uuid::from_u128(id)), name))
}

fn arb_body() -> impl Strategy<Value = MovementBody> {
    prop_oneof![
        Just(MovementBody::Simple),
        (1i64..50, 0i64..10_000).prop_map(|(qty, cents)| {
            let line = LineItem::new(
                ItemCode::parse("SKU").unwrap(),
                "Item".into(),
                qty,
                Decimal::new(cents, 2),
            )
            .unwrap();
            MovementBody::line_itemed(StockDirection::Sale, vec![line]).unwrap()
        }),
    ]
}

fn movement(state: MovementState, body: MovementBody, actor: Actor) -> Movement {
    Movement {
        id: MovementId::new(),
        account_id: AccountId::new(),
        kind: MovementKind::Outflow,
        amount: Decimal::ONE,
        description: String::new(),
        timestamp: Utc::now(),
        sequence: 1,
        balance_after: Decimal::ZERO,
        actor,
        body,
        state,
        cancellation: None,
        modification: None,
        replaces: None,
        replaced_by: None,
        idempotency_key: None,
        version: 0,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Cancel proceeds exactly when the transition table allows it.
    #[test]
    fn prop_cancel_matches_transition_table(state in arb_state(), actor in arb_actor()) {
        let m = movement(state, MovementBody::Simple, actor.clone());
        let decision = LifecycleService::cancel(&m, actor, None);
        let allowed = LifecycleService::is_valid_transition(state, LifecycleOperation::Cancel);
        match decision {
            CancelDecision::Proceed(action) => {
                prop_assert!(allowed);
                prop_assert_eq!(action.new_state(), MovementState::Cancelled);
            }
            CancelDecision::AlreadyCancelled => {
                prop_assert!(!allowed);
                prop_assert_eq!(state, MovementState::Cancelled);
            }
        }
    }

    /// Restore proceeds only from Cancelled and is informational elsewhere.
    #[test]
    fn prop_restore_only_from_cancelled(state in arb_state(), actor in arb_actor()) {
        let m = movement(state, MovementBody::Simple, actor.clone());
        match LifecycleService::restore(&m, actor) {
            Ok(RestoreDecision::Proceed(action)) => {
                prop_assert_eq!(state, MovementState::Cancelled);
                prop_assert_eq!(action.new_state(), MovementState::Restored);
            }
            Ok(RestoreDecision::NotCancelled) => prop_assert_ne!(state, MovementState::Cancelled),
            Err(e) => prop_assert!(false, "unexpected error {e}"),
        }
    }

    /// Edit policy follows the body shape; invalid states always error.
    #[test]
    fn prop_edit_policy_follows_shape(
        state in arb_state(),
        body in arb_body(),
        actor in arb_actor(),
    ) {
        let line_itemed = body.is_line_itemed();
        let m = movement(state, body, actor.clone());
        let result = LifecycleService::edit(&m, actor.clone(), None);
        let allowed = LifecycleService::is_valid_transition(state, LifecycleOperation::Edit);

        match result {
            Ok(EditPolicy::InPlace(action)) => {
                prop_assert!(allowed && !line_itemed);
                prop_assert_eq!(action.new_state(), MovementState::Modified);
            }
            Ok(EditPolicy::CancelAndRecreate(action)) => {
                prop_assert!(allowed && line_itemed);
                prop_assert_eq!(action.new_state(), MovementState::Cancelled);
            }
            Err(LedgerError::InvalidTransition { from, .. }) => {
                prop_assert!(!allowed);
                prop_assert_eq!(from, state);
            }
            Err(e) => prop_assert!(false, "unexpected error {e}"),
        }
    }

    /// Applying a cancel records the actor and keeps everything else intact.
    #[test]
    fn prop_cancel_records_actor(actor in arb_actor(), body in arb_body()) {
        let mut m = movement(MovementState::Active, body, actor.clone());
        let before = m.clone();
        let CancelDecision::Proceed(action) = LifecycleService::cancel(&m, actor.clone(), None) else {
            return Err(TestCaseError::fail("expected Proceed"));
        };
        action.apply_to(&mut m);

        prop_assert_eq!(m.state, MovementState::Cancelled);
        prop_assert_eq!(&m.cancellation.as_ref().unwrap().cancelled_by, &actor);
        prop_assert_eq!(&m.body, &before.body);
        prop_assert_eq!(m.amount, before.amount);
    }
}
