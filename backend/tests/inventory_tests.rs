//! Inventory and catalog stock tests
//!
//! - Products with no stock are never active
//! - Stock levels and report statuses bucket quantities against thresholds
//! - Manual movements keep the ledger balance consistent

use proptest::prelude::*;
use shared::{
    availability_label, derive_active, plan_manual_movement, stock_fill_percent,
    validate_stock_limits, ManualMovementInput, MovementError, MovementType, StockLevel,
    StockStatus, MAX_STOCK_QUANTITY,
};
use uuid::Uuid;

fn movement(movement_type: MovementType, quantity: i32) -> ManualMovementInput {
    ManualMovementInput {
        movement_type,
        quantity,
        note: None,
    }
}

// ============================================================================
// Property Test Strategies
// ============================================================================

/// (min, ideal) pairs with min <= ideal
fn limits_strategy() -> impl Strategy<Value = (i32, i32)> {
    (0i32..200, 0i32..200).prop_map(|(a, b)| (a.min(b), a.max(b)))
}

fn movement_type_strategy() -> impl Strategy<Value = MovementType> {
    prop_oneof![
        Just(MovementType::Entry),
        Just(MovementType::Exit),
        Just(MovementType::Adjustment),
    ]
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_availability_labels() {
        assert_eq!(availability_label(1), "Only 1 unit");
        assert_eq!(availability_label(49), "Only 49 units");
        assert_eq!(availability_label(50), "+50 available");
        assert_eq!(availability_label(149), "+100 available");
        assert_eq!(availability_label(500), "+500 available");
        assert_eq!(availability_label(12_000), "+500 available");
    }

    #[test]
    fn test_level_and_status_boundaries_differ_at_min() {
        assert_eq!(StockLevel::classify(5, 5, 20), StockLevel::Medium);
        assert_eq!(StockStatus::classify(5, 5, 20), StockStatus::Minimum);
        assert_eq!(StockLevel::classify(20, 5, 20), StockLevel::Medium);
        assert_eq!(StockStatus::classify(21, 5, 20), StockStatus::Good);
    }

    #[test]
    fn test_fill_percent_with_missing_ideal() {
        assert_eq!(stock_fill_percent(0, 0), 0);
        assert_eq!(stock_fill_percent(3, 0), 100);
        assert_eq!(stock_fill_percent(5, 20), 25);
    }

    #[test]
    fn test_exit_beyond_stock_is_rejected() {
        let err = plan_manual_movement(Uuid::new_v4(), 3, &movement(MovementType::Exit, 4))
            .unwrap_err();
        assert_eq!(
            err,
            MovementError::Insufficient {
                available: 3,
                requested: 4
            }
        );
    }

    #[test]
    fn test_adjustment_records_delta_and_note() {
        let planned =
            plan_manual_movement(Uuid::new_v4(), 10, &movement(MovementType::Adjustment, 7))
                .unwrap();
        assert_eq!(planned.quantity_change, -3);
        assert_eq!(planned.resulting_balance, 7);
        assert_eq!(planned.note, "Adjusted from 10 to 7");
    }

    #[test]
    fn test_custom_note_is_trimmed() {
        let mut input = movement(MovementType::Entry, 2);
        input.note = Some("  supplier delivery ".to_string());
        let planned = plan_manual_movement(Uuid::new_v4(), 0, &input).unwrap();
        assert_eq!(planned.note, "supplier delivery");
    }

    #[test]
    fn test_entry_past_stock_limit_is_rejected() {
        let err = plan_manual_movement(Uuid::new_v4(), 5, &movement(MovementType::Entry, i32::MAX))
            .unwrap_err();
        assert_eq!(
            err,
            MovementError::StockLimitExceeded {
                max: MAX_STOCK_QUANTITY
            }
        );
        let planned = plan_manual_movement(
            Uuid::new_v4(),
            MAX_STOCK_QUANTITY - 1,
            &movement(MovementType::Entry, 1),
        )
        .unwrap();
        assert_eq!(planned.resulting_balance, MAX_STOCK_QUANTITY);
    }

    #[test]
    fn test_limits_must_be_ordered() {
        assert!(validate_stock_limits(5, 20).is_ok());
        assert!(validate_stock_limits(21, 20).is_err());
        assert!(validate_stock_limits(-1, 20).is_err());
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

        /// A product is active only with stock and without the manual switch
        #[test]
        fn prop_active_requires_stock(quantity in -10i32..1000, deactivated: bool) {
            let active = derive_active(quantity, deactivated);
            if quantity <= 0 || deactivated {
                prop_assert!(!active);
            } else {
                prop_assert!(active);
            }
        }

        /// Every quantity falls in exactly the bucket its thresholds define
        #[test]
        fn prop_level_matches_thresholds(quantity in 0i32..400, (min, ideal) in limits_strategy()) {
            let level = StockLevel::classify(quantity, min, ideal);
            let expected = if quantity < min {
                StockLevel::Low
            } else if quantity <= ideal {
                StockLevel::Medium
            } else {
                StockLevel::High
            };
            prop_assert_eq!(level, expected);
            prop_assert_eq!(level.as_str().parse::<StockLevel>().unwrap(), level);
        }

        /// Fill percentage stays within 0..=100
        #[test]
        fn prop_fill_percent_bounded(quantity in -50i32..10_000, ideal in 0i32..500) {
            let percent = stock_fill_percent(quantity, ideal);
            prop_assert!((0..=100).contains(&percent));
        }

        /// Accepted movements keep balance = current + change and never go negative
        #[test]
        fn prop_movement_balance_consistent(
            current in 0i32..500,
            kind in movement_type_strategy(),
            quantity in -5i32..600,
        ) {
            if let Ok(planned) = plan_manual_movement(Uuid::new_v4(), current, &movement(kind, quantity)) {
                prop_assert_eq!(planned.resulting_balance, current + planned.quantity_change);
                prop_assert!(planned.resulting_balance >= 0);
                prop_assert!(planned.quantity_change != 0);
                match kind {
                    MovementType::Entry => prop_assert!(planned.quantity_change > 0),
                    MovementType::Exit => prop_assert!(planned.quantity_change < 0),
                    MovementType::Adjustment => prop_assert_eq!(planned.resulting_balance, quantity),
                }
            }
        }
    }
}
