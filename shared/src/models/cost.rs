//! Product cost and margin models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only record of a unit cost change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostHistoryEntry {
    pub id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub old_cost: Decimal,
    pub new_cost: Decimal,
    pub changed_by: Option<Uuid>,
    pub changed_by_username: Option<String>,
    pub changed_at: DateTime<Utc>,
}

/// Unit economics for a product at its current price and cost
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductMargin {
    pub cost: Decimal,
    pub price: Decimal,
    pub unit_profit: Option<Decimal>,
    /// Markup over cost, in percent
    pub margin_percent: Option<Decimal>,
}

impl ProductMargin {
    /// Profit and margin are only defined once a positive cost is known.
    pub fn compute(price: Decimal, cost: Decimal) -> Self {
        if cost > Decimal::ZERO {
            let unit_profit = price - cost;
            let margin = (unit_profit / cost * Decimal::ONE_HUNDRED).round_dp(2);
            Self {
                cost,
                price,
                unit_profit: Some(unit_profit),
                margin_percent: Some(margin),
            }
        } else {
            Self {
                cost,
                price,
                unit_profit: None,
                margin_percent: None,
            }
        }
    }
}

/// Whether a submitted cost should produce a history row
pub fn cost_changed(current: Decimal, submitted: Decimal) -> bool {
    current != submitted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_margin_with_cost() {
        let m = ProductMargin::compute(Decimal::new(1500, 2), Decimal::new(1000, 2));
        assert_eq!(m.unit_profit, Some(Decimal::new(500, 2)));
        assert_eq!(m.margin_percent, Some(Decimal::new(50, 0)));
    }

    #[test]
    fn test_margin_without_cost() {
        let m = ProductMargin::compute(Decimal::new(1500, 2), Decimal::ZERO);
        assert!(m.unit_profit.is_none());
        assert!(m.margin_percent.is_none());
    }

    #[test]
    fn test_cost_changed_ignores_scale() {
        assert!(!cost_changed(Decimal::new(1000, 2), Decimal::new(10, 0)));
        assert!(cost_changed(Decimal::new(1000, 2), Decimal::new(1001, 2)));
    }
}
