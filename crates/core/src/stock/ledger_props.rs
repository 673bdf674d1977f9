//! Property-based tests for the stock ledger.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use stockledger_shared::types::ItemCode;

use crate::error::LedgerError;
use crate::model::{Item, LineItem, StockDirection};
use crate::stock::delta::StockDelta;
use crate::stock::ledger::{MissingItemPolicy, StockLedger};

const CODES: [&str; 4] = ["A", "B", "C", "D"];

fn arb_lines() -> impl Strategy<Value = Vec<LineItem>> {
    prop::collection::vec((0usize..CODES.len(), 1i64..20), 1..8).prop_map(|picks| {
        picks
            .into_iter()
            .map(|(idx, qty)| {
                LineItem::new(
                    ItemCode::parse(CODES[idx]).unwrap(),
                    CODES[idx].to_string(),
                    qty,
                    Decimal::ONE,
                )
                .unwrap()
            })
            .collect()
    })
}

fn arb_direction() -> impl Strategy<Value = StockDirection> {
    prop_oneof![Just(StockDirection::Sale), Just(StockDirection::Purchase)]
}

fn arb_catalogue() -> impl Strategy<Value = BTreeMap<ItemCode, Item>> {
    prop::collection::vec(0i64..60, CODES.len()).prop_map(|quantities| {
        CODES
            .iter()
            .zip(quantities)
            .map(|(c, quantity)| {
                let code = ItemCode::parse(c).unwrap();
                let item = Item {
                    code: code.clone(),
                    name: (*c).to_string(),
                    quantity,
                    selling_price: Decimal::ONE,
                    last_cost_price: None,
                    margin_percent: None,
                    version: 0,
                };
                (code, item)
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Applying a delta and then its inverse restores every quantity.
    #[test]
    fn prop_inverse_round_trips(
        direction in arb_direction(),
        lines in arb_lines(),
        catalogue in arb_catalogue(),
    ) {
        let delta = StockDelta::from_lines(direction, &lines).unwrap();
        let Ok(forward) = StockLedger::plan(&delta, &catalogue, MissingItemPolicy::Reject) else {
            return Ok(());
        };

        let mut after = catalogue.clone();
        for adjustment in &forward {
            adjustment.apply_to(after.get_mut(&adjustment.code).unwrap());
        }
        let backward =
            StockLedger::plan(&delta.inverse(), &after, MissingItemPolicy::Reject).unwrap();
        for adjustment in &backward {
            adjustment.apply_to(after.get_mut(&adjustment.code).unwrap());
        }

        prop_assert_eq!(after, catalogue);
    }

    /// A successful plan never leaves a quantity below zero.
    #[test]
    fn prop_plan_never_goes_negative(lines in arb_lines(), catalogue in arb_catalogue()) {
        let delta = StockDelta::from_lines(StockDirection::Sale, &lines).unwrap();
        match StockLedger::plan(&delta, &catalogue, MissingItemPolicy::Reject) {
            Ok(plan) => {
                for adjustment in plan {
                    prop_assert!(adjustment.after >= 0);
                    prop_assert_eq!(adjustment.change(), delta.get(&adjustment.code));
                }
            }
            Err(LedgerError::InsufficientStock { available, requested, shortfall, .. }) => {
                prop_assert!(requested > available);
                prop_assert_eq!(shortfall, requested - available);
            }
            Err(e) => prop_assert!(false, "unexpected error {e}"),
        }
    }

    /// Net-effect checking accepts any edit that reduces or keeps each line.
    #[test]
    fn prop_net_edit_never_short_when_reducing(
        lines in arb_lines(),
        catalogue in arb_catalogue(),
    ) {
        let original = StockDelta::from_lines(StockDirection::Sale, &lines).unwrap();
        let Ok(forward) = StockLedger::plan(&original, &catalogue, MissingItemPolicy::Reject) else {
            return Ok(());
        };
        let mut after = catalogue.clone();
        for adjustment in &forward {
            adjustment.apply_to(after.get_mut(&adjustment.code).unwrap());
        }

        let halved: Vec<LineItem> = lines
            .iter()
            .map(|l| {
                LineItem::new(l.item_code.clone(), l.item_name.clone(), (l.quantity + 1) / 2, l.unit_price)
                    .unwrap()
            })
            .collect();
        let redo = StockDelta::from_lines(StockDirection::Sale, &halved).unwrap();
        let net = original.inverse().merge(&redo).unwrap();

        prop_assert!(StockLedger::plan(&net, &after, MissingItemPolicy::Reject).is_ok());
    }
}
