//! Cart and checkout total tests
//!
//! - Line totals use the frozen unit price
//! - Cart totals are the sum of line totals
//! - Adding to an existing line accumulates quantity

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    cart_total, merged_quantity, CartError, CartLine, CartView, QuantityChange, MAX_LINE_QUANTITY,
};
use uuid::Uuid;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn line(price: Decimal, quantity: i32) -> CartLine {
    CartLine::new(
        Uuid::new_v4(),
        Uuid::new_v4(),
        "Item".to_string(),
        None,
        price,
        quantity,
    )
}

/// Prices in cents up to 999.99
fn price_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..100_000).prop_map(|cents| Decimal::new(cents, 2))
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_two_lines_total_25() {
        let view = CartView::from_lines(
            Some(Uuid::new_v4()),
            vec![line(dec("10.00"), 2), line(dec("5.00"), 1)],
        );
        assert_eq!(view.total, dec("25.00"));
        assert_eq!(view.item_count, 3);
        assert_eq!(view.items[0].line_total, dec("20.00"));
    }

    #[test]
    fn test_empty_cart() {
        let view = CartView::from_lines(None, Vec::new());
        assert!(view.is_empty());
        assert_eq!(view.total, Decimal::ZERO);
    }

    #[test]
    fn test_merge_rejects_non_positive() {
        assert_eq!(merged_quantity(Some(2), 0), Err(CartError::InvalidQuantity));
        assert_eq!(merged_quantity(None, -1), Err(CartError::InvalidQuantity));
        assert_eq!(merged_quantity(Some(2), 3), Ok(5));
    }

    #[test]
    fn test_merge_refuses_to_pass_line_limit() {
        assert_eq!(
            merged_quantity(Some(i32::MAX - 1), 5),
            Err(CartError::QuantityTooLarge {
                max: MAX_LINE_QUANTITY
            })
        );
        assert_eq!(merged_quantity(Some(MAX_LINE_QUANTITY - 2), 2), Ok(MAX_LINE_QUANTITY));
    }

    #[test]
    fn test_item_count_of_huge_lines() {
        let view = CartView::from_lines(None, vec![line(dec("1.00"), i32::MAX), line(dec("1.00"), 1)]);
        assert_eq!(view.item_count, 2_147_483_648);
    }

    #[test]
    fn test_quantity_update_semantics() {
        assert_eq!(QuantityChange::from_requested(0), QuantityChange::Remove);
        assert_eq!(QuantityChange::from_requested(-3), QuantityChange::Remove);
        assert_eq!(QuantityChange::from_requested(4), QuantityChange::Set(4));
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

        /// Cart total is the sum of price times quantity over all lines
        #[test]
        fn prop_cart_total_is_sum_of_lines(
            lines in prop::collection::vec((price_strategy(), 1i32..50), 0..10)
        ) {
            let cart: Vec<CartLine> = lines.iter().map(|(p, q)| line(*p, *q)).collect();
            let expected: Decimal = lines.iter().map(|(p, q)| *p * Decimal::from(*q)).sum();
            prop_assert_eq!(cart_total(&cart), expected);
            prop_assert_eq!(CartView::from_lines(None, cart).total, expected);
        }

        /// Adding units accumulates on top of what the line already holds
        #[test]
        fn prop_merge_accumulates(existing in prop::option::of(1i32..1000), added in 1i32..1000) {
            let merged = merged_quantity(existing, added).unwrap();
            prop_assert_eq!(merged, existing.unwrap_or(0) + added);
        }

        /// Across all of i32 a merge either stays within the line limit or is refused
        #[test]
        fn prop_merge_never_exceeds_limit(existing in prop::option::of(any::<i32>()), added in any::<i32>()) {
            match merged_quantity(existing, added) {
                Ok(merged) => {
                    prop_assert!(merged <= MAX_LINE_QUANTITY);
                    prop_assert_eq!(
                        i64::from(merged),
                        i64::from(existing.unwrap_or(0)) + i64::from(added)
                    );
                }
                Err(CartError::InvalidQuantity) => prop_assert!(added < 1),
                Err(CartError::QuantityTooLarge { .. }) => {
                    prop_assert!(i64::from(existing.unwrap_or(0)) + i64::from(added) > i64::from(MAX_LINE_QUANTITY));
                }
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
        }
    }
}
