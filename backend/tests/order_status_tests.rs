//! Order status transition tests
//!
//! Verifies the stock rules tied to order status:
//! - Paying debits each line exactly and records matching exit movements
//! - Cancelling a paid order restocks each line
//! - Shortages block payment unless forced, and forced debits never go negative

use std::collections::HashMap;

use proptest::prelude::*;
use shared::{
    plan_status_change, MovementType, OrderStatus, StatusChangeError, StockLine,
    MAX_LINE_QUANTITY, MAX_STOCK_QUANTITY,
};
use uuid::Uuid;

fn line(product_id: Uuid, quantity: i32) -> StockLine {
    StockLine {
        product_id: Some(product_id),
        product_name: format!("Product {}", &product_id.to_string()[..8]),
        quantity,
    }
}

// ============================================================================
// Property Test Strategies
// ============================================================================

fn status_strategy() -> impl Strategy<Value = OrderStatus> {
    prop_oneof![
        Just(OrderStatus::Pending),
        Just(OrderStatus::Paid),
        Just(OrderStatus::Cancelled),
    ]
}

/// Order lines over a small product pool, so products repeat across lines
fn order_strategy() -> impl Strategy<Value = (Vec<(usize, i32)>, Vec<i32>)> {
    (
        prop::collection::vec((0usize..4, 1i32..20), 1..8),
        prop::collection::vec(0i32..60, 4),
    )
}

fn build(lines: &[(usize, i32)], stock_levels: &[i32]) -> (Vec<StockLine>, HashMap<Uuid, i32>) {
    let products: Vec<Uuid> = (0..stock_levels.len()).map(|_| Uuid::new_v4()).collect();
    let stock = products
        .iter()
        .zip(stock_levels)
        .map(|(id, qty)| (*id, *qty))
        .collect();
    let lines = lines
        .iter()
        .map(|(idx, qty)| line(products[*idx], *qty))
        .collect();
    (lines, stock)
}

fn demand(lines: &[StockLine]) -> HashMap<Uuid, i32> {
    let mut totals = HashMap::new();
    for l in lines {
        if let Some(id) = l.product_id {
            *totals.entry(id).or_insert(0) += l.quantity;
        }
    }
    totals
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_pending_to_paid_debits_each_line() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let stock = HashMap::from([(a, 10), (b, 3)]);
        let plan = plan_status_change(
            "ORD-1",
            OrderStatus::Pending,
            OrderStatus::Paid,
            &[line(a, 2), line(b, 3)],
            &stock,
            false,
        )
        .unwrap();

        let balances = plan.final_balances();
        assert_eq!(balances[&a], 8);
        assert_eq!(balances[&b], 0);
        assert!(plan
            .movements
            .iter()
            .all(|m| m.movement_type == MovementType::Exit));
        assert!(plan.movements[0].note.contains("ORD-1"));
    }

    #[test]
    fn test_cancelled_to_paid_also_debits() {
        let a = Uuid::new_v4();
        let stock = HashMap::from([(a, 4)]);
        let plan = plan_status_change(
            "ORD-2",
            OrderStatus::Cancelled,
            OrderStatus::Paid,
            &[line(a, 4)],
            &stock,
            false,
        )
        .unwrap();
        assert_eq!(plan.final_balances()[&a], 0);
    }

    #[test]
    fn test_paid_to_pending_leaves_stock_alone() {
        let a = Uuid::new_v4();
        let stock = HashMap::from([(a, 4)]);
        let plan = plan_status_change(
            "ORD-3",
            OrderStatus::Paid,
            OrderStatus::Pending,
            &[line(a, 4)],
            &stock,
            false,
        )
        .unwrap();
        assert!(plan.movements.is_empty());
        assert!(!plan.is_noop());
    }

    #[test]
    fn test_shortage_lists_every_short_line() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let stock = HashMap::from([(a, 1), (b, 0)]);
        let err = plan_status_change(
            "ORD-4",
            OrderStatus::Pending,
            OrderStatus::Paid,
            &[line(a, 2), line(b, 1)],
            &stock,
            false,
        )
        .unwrap_err();
        match err {
            StatusChangeError::InsufficientStock { shortages } => {
                assert_eq!(shortages.len(), 2);
                assert_eq!(shortages[1].available, 0);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_forced_zero_stock_still_records_movement() {
        let a = Uuid::new_v4();
        let stock = HashMap::from([(a, 0)]);
        let plan = plan_status_change(
            "ORD-5",
            OrderStatus::Pending,
            OrderStatus::Paid,
            &[line(a, 3)],
            &stock,
            true,
        )
        .unwrap();
        assert_eq!(plan.movements.len(), 1);
        assert_eq!(plan.movements[0].quantity_change, 0);
        assert_eq!(plan.movements[0].resulting_balance, 0);
        assert_eq!(plan.shortages[0].required, 3);
    }

    #[test]
    fn test_cancel_restock_overflow_is_an_error() {
        let a = Uuid::new_v4();
        let stock = HashMap::from([(a, 10)]);
        let err = plan_status_change(
            "ORD-6",
            OrderStatus::Paid,
            OrderStatus::Cancelled,
            &[line(a, i32::MAX)],
            &stock,
            false,
        )
        .unwrap_err();
        assert!(matches!(err, StatusChangeError::StockLimitExceeded { .. }));
    }

    #[test]
    fn test_cancel_restock_up_to_stock_limit() {
        let a = Uuid::new_v4();
        let stock = HashMap::from([(a, MAX_STOCK_QUANTITY - MAX_LINE_QUANTITY)]);
        let plan = plan_status_change(
            "ORD-7",
            OrderStatus::Paid,
            OrderStatus::Cancelled,
            &[line(a, MAX_LINE_QUANTITY)],
            &stock,
            false,
        )
        .unwrap();
        assert_eq!(plan.final_balances()[&a], MAX_STOCK_QUANTITY);
        assert_eq!(plan.movements[0].quantity_change, MAX_LINE_QUANTITY);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Paying with enough stock lowers each product by exactly its demand
        #[test]
        fn prop_payment_debits_exact_demand((lines, levels) in order_strategy()) {
            let (lines, mut stock) = build(&lines, &levels);
            let needed = demand(&lines);
            for (id, qty) in &needed {
                let entry = stock.get_mut(id).unwrap();
                *entry = (*entry).max(*qty);
            }

            let plan = plan_status_change(
                "ORD-P", OrderStatus::Pending, OrderStatus::Paid, &lines, &stock, false,
            ).unwrap();

            prop_assert!(plan.shortages.is_empty());
            let balances = plan.final_balances();
            for (id, qty) in &needed {
                prop_assert_eq!(balances[id], stock[id] - qty);
            }
            let debited: i32 = plan.movements.iter().map(|m| -m.quantity_change).sum();
            prop_assert_eq!(debited, needed.values().sum::<i32>());
        }

        /// Paying then cancelling returns every product to its starting quantity
        #[test]
        fn prop_pay_then_cancel_restores_stock((lines, levels) in order_strategy()) {
            let (lines, mut stock) = build(&lines, &levels);
            for (id, qty) in demand(&lines) {
                let entry = stock.get_mut(&id).unwrap();
                *entry = (*entry).max(qty);
            }

            let paid = plan_status_change(
                "ORD-R", OrderStatus::Pending, OrderStatus::Paid, &lines, &stock, false,
            ).unwrap();
            let mut after_pay = stock.clone();
            after_pay.extend(paid.final_balances());

            let cancelled = plan_status_change(
                "ORD-R", OrderStatus::Paid, OrderStatus::Cancelled, &lines, &after_pay, false,
            ).unwrap();
            let mut after_cancel = after_pay.clone();
            after_cancel.extend(cancelled.final_balances());

            prop_assert_eq!(after_cancel, stock);
            prop_assert!(cancelled.movements.iter().all(|m| m.movement_type == MovementType::Entry));
        }

        /// Forced payment never drives stock below zero
        #[test]
        fn prop_forced_payment_never_negative((lines, levels) in order_strategy()) {
            let (lines, stock) = build(&lines, &levels);
            let plan = plan_status_change(
                "ORD-F", OrderStatus::Pending, OrderStatus::Paid, &lines, &stock, true,
            ).unwrap();
            for movement in &plan.movements {
                prop_assert!(movement.resulting_balance >= 0);
                prop_assert!(movement.quantity_change <= 0);
            }
        }

        /// Without force, a plan either covers the demand or fails with shortages
        #[test]
        fn prop_unforced_payment_all_or_nothing((lines, levels) in order_strategy()) {
            let (lines, stock) = build(&lines, &levels);
            let short = demand(&lines).iter().any(|(id, qty)| stock[id] < *qty);
            let result = plan_status_change(
                "ORD-N", OrderStatus::Pending, OrderStatus::Paid, &lines, &stock, false,
            );
            match result {
                Ok(plan) => {
                    prop_assert!(!short);
                    prop_assert!(!plan.forced());
                }
                Err(StatusChangeError::InsufficientStock { shortages }) => {
                    prop_assert!(short);
                    prop_assert!(!shortages.is_empty());
                }
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
        }

        /// Over the full accepted ranges, a restock either adds exactly the line
        /// quantity or is refused for exceeding the stock limit
        #[test]
        fn prop_cancel_restock_exact_or_refused(
            current in 0i32..=MAX_STOCK_QUANTITY,
            qty in 1i32..=MAX_LINE_QUANTITY,
        ) {
            let a = Uuid::new_v4();
            let stock = HashMap::from([(a, current)]);
            let result = plan_status_change(
                "ORD-B", OrderStatus::Paid, OrderStatus::Cancelled, &[line(a, qty)], &stock, false,
            );
            match result {
                Ok(plan) => {
                    prop_assert!(current + qty <= MAX_STOCK_QUANTITY);
                    prop_assert_eq!(plan.final_balances()[&a], current + qty);
                }
                Err(StatusChangeError::StockLimitExceeded { max, .. }) => {
                    prop_assert!(current + qty > max);
                }
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
        }

        /// Paying over the full accepted ranges never drives stock negative
        #[test]
        fn prop_payment_bounded_at_full_range(
            current in 0i32..=MAX_STOCK_QUANTITY,
            qty in 1i32..=MAX_LINE_QUANTITY,
            force: bool,
        ) {
            let a = Uuid::new_v4();
            let stock = HashMap::from([(a, current)]);
            let result = plan_status_change(
                "ORD-W", OrderStatus::Pending, OrderStatus::Paid, &[line(a, qty)], &stock, force,
            );
            if let Ok(plan) = result {
                let balance = plan.final_balances()[&a];
                prop_assert!(balance >= 0);
                prop_assert_eq!(balance, (current - qty).max(0));
            } else {
                prop_assert!(!force && current < qty);
            }
        }

        /// Only entering or leaving Paid touches stock
        #[test]
        fn prop_stock_effect_only_around_paid(
            from in status_strategy(),
            to in status_strategy(),
            qty in 1i32..10,
        ) {
            let a = Uuid::new_v4();
            let stock = HashMap::from([(a, 100)]);
            let plan = plan_status_change("ORD-S", from, to, &[line(a, qty)], &stock, false).unwrap();
            let expected = matches!(
                (from, to),
                (OrderStatus::Pending | OrderStatus::Cancelled, OrderStatus::Paid)
                    | (OrderStatus::Paid, OrderStatus::Cancelled)
            );
            prop_assert_eq!(!plan.movements.is_empty(), expected);
        }
    }
}
