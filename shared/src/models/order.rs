//! Order models and the stock rules tied to order status changes

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::stock::{MovementType, PlannedMovement};
use crate::validation::MAX_STOCK_QUANTITY;

/// Order lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "paid" => Ok(OrderStatus::Paid),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status '{}'", other)),
        }
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "Pending"),
            OrderStatus::Paid => write!(f, "Paid"),
            OrderStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// A customer purchase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    /// Human-readable unique number, e.g. "ORD-20261018-000042"
    pub order_number: String,
    pub customer_id: Option<Uuid>,
    pub status: OrderStatus,
    pub total: Decimal,
    pub customer_name: String,
    pub phone: String,
    pub delivery_address: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order line with values frozen at checkout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    /// Cleared if the product is later deleted
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub unit_price: Decimal,
    pub unit_cost: Decimal,
    pub quantity: i32,
}

impl OrderItem {
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    pub fn cost_total(&self) -> Decimal {
        self.unit_cost * Decimal::from(self.quantity)
    }
}

/// Total cost of goods for a set of order lines
pub fn order_cost(items: &[OrderItem]) -> Decimal {
    items.iter().map(OrderItem::cost_total).sum()
}

/// Build an order number from the order date and a database sequence value
pub fn generate_order_number(date: NaiveDate, sequence: i64) -> String {
    format!("ORD-{}-{:06}", date.format("%Y%m%d"), sequence)
}

/// The part of an order line that matters for stock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockLine {
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub quantity: i32,
}

impl From<&OrderItem> for StockLine {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            quantity: item.quantity,
        }
    }
}

/// A line that cannot be fully served from current stock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockShortage {
    pub product_id: Uuid,
    pub product_name: String,
    pub required: i32,
    pub available: i32,
}

/// Stock effects of moving an order from one status to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionPlan {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub movements: Vec<PlannedMovement>,
    /// Shortages that were overridden with `force`
    pub shortages: Vec<StockShortage>,
}

impl TransitionPlan {
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }

    pub fn forced(&self) -> bool {
        !self.shortages.is_empty()
    }

    /// Final quantity per product after all movements are applied
    pub fn final_balances(&self) -> HashMap<Uuid, i32> {
        self.movements
            .iter()
            .map(|m| (m.product_id, m.resulting_balance))
            .collect()
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StatusChangeError {
    #[error("insufficient stock for {} product(s)", .shortages.len())]
    InsufficientStock { shortages: Vec<StockShortage> },
    #[error("product {0} is missing from the stock snapshot")]
    MissingStock(Uuid),
    #[error("restocking {product_name} would exceed {max} units")]
    StockLimitExceeded { product_name: String, max: i32 },
}

/// Plan the stock effects of changing an order's status.
///
/// `stock` holds the current quantity of every product referenced by
/// `lines`. Only two transitions touch stock: entering `Paid` from
/// `Pending`/`Cancelled` debits each line, and leaving `Paid` for
/// `Cancelled` credits it back. Lines whose product has been deleted are
/// skipped.
///
/// When paying, any line that exceeds the stock left after earlier lines is
/// reported as a shortage. Without `force` the shortages are returned as an
/// error; with `force` each debit is clamped so stock never goes below zero.
pub fn plan_status_change(
    order_number: &str,
    from: OrderStatus,
    to: OrderStatus,
    lines: &[StockLine],
    stock: &HashMap<Uuid, i32>,
    force: bool,
) -> Result<TransitionPlan, StatusChangeError> {
    let mut plan = TransitionPlan {
        from,
        to,
        movements: Vec::new(),
        shortages: Vec::new(),
    };

    if from == to {
        return Ok(plan);
    }

    let mut balances: HashMap<Uuid, i32> = HashMap::new();

    match (from, to) {
        (OrderStatus::Pending | OrderStatus::Cancelled, OrderStatus::Paid) => {
            let mut debits = Vec::with_capacity(lines.len());
            for line in lines {
                let Some(product_id) = line.product_id else {
                    continue;
                };
                let available = running_balance(&balances, stock, product_id)?;
                let debit = line.quantity.clamp(0, available.max(0));
                if available < line.quantity {
                    plan.shortages.push(StockShortage {
                        product_id,
                        product_name: line.product_name.clone(),
                        required: line.quantity,
                        available: available.max(0),
                    });
                }
                let resulting = available - debit;
                balances.insert(product_id, resulting);
                debits.push((product_id, line.quantity, debit, resulting));
            }

            if !plan.shortages.is_empty() && !force {
                return Err(StatusChangeError::InsufficientStock {
                    shortages: plan.shortages,
                });
            }

            plan.movements = debits
                .into_iter()
                .map(|(product_id, required, debit, resulting)| {
                    let note = if debit < required {
                        format!(
                            "Order {} paid (forced, {} unit(s) short)",
                            order_number,
                            required - debit
                        )
                    } else {
                        format!("Order {} paid", order_number)
                    };
                    PlannedMovement {
                        product_id,
                        movement_type: MovementType::Exit,
                        quantity_change: -debit,
                        resulting_balance: resulting,
                        note,
                    }
                })
                .collect();
        }
        (OrderStatus::Paid, OrderStatus::Cancelled) => {
            for line in lines {
                let Some(product_id) = line.product_id else {
                    continue;
                };
                let resulting = running_balance(&balances, stock, product_id)?
                    .checked_add(line.quantity)
                    .filter(|q| *q <= MAX_STOCK_QUANTITY)
                    .ok_or_else(|| StatusChangeError::StockLimitExceeded {
                        product_name: line.product_name.clone(),
                        max: MAX_STOCK_QUANTITY,
                    })?;
                balances.insert(product_id, resulting);
                plan.movements.push(PlannedMovement {
                    product_id,
                    movement_type: MovementType::Entry,
                    quantity_change: line.quantity,
                    resulting_balance: resulting,
                    note: format!("Order {} cancelled, items restocked", order_number),
                });
            }
        }
        _ => {}
    }

    Ok(plan)
}

/// Quantity left after earlier lines of the same plan, or the snapshot value
fn running_balance(
    balances: &HashMap<Uuid, i32>,
    stock: &HashMap<Uuid, i32>,
    product_id: Uuid,
) -> Result<i32, StatusChangeError> {
    balances
        .get(&product_id)
        .or_else(|| stock.get(&product_id))
        .copied()
        .ok_or(StatusChangeError::MissingStock(product_id))
}

/// Checkout form data
#[derive(Debug, Clone, Serialize, Deserialize, validator::Validate)]
pub struct CheckoutInput {
    #[validate(length(min = 1, max = 150, message = "name is required"))]
    pub customer_name: String,
    #[validate(length(min = 8, max = 30, message = "phone is required"))]
    pub phone: String,
    #[validate(length(min = 5, max = 500, message = "delivery address is required"))]
    pub delivery_address: String,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: Uuid, quantity: i32) -> StockLine {
        StockLine {
            product_id: Some(product_id),
            product_name: "Mug".to_string(),
            quantity,
        }
    }

    #[test]
    fn test_order_number_format() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert_eq!(generate_order_number(date, 42), "ORD-20261018-000042");
    }

    #[test]
    fn test_pay_with_enough_stock() {
        let p = Uuid::new_v4();
        let stock = HashMap::from([(p, 10)]);
        let plan = plan_status_change(
            "A1",
            OrderStatus::Pending,
            OrderStatus::Paid,
            &[line(p, 3)],
            &stock,
            false,
        )
        .unwrap();
        assert_eq!(plan.movements.len(), 1);
        assert_eq!(plan.movements[0].movement_type, MovementType::Exit);
        assert_eq!(plan.movements[0].quantity_change, -3);
        assert_eq!(plan.movements[0].resulting_balance, 7);
        assert!(!plan.forced());
    }

    #[test]
    fn test_pay_short_without_force_fails() {
        let p = Uuid::new_v4();
        let stock = HashMap::from([(p, 2)]);
        let err = plan_status_change(
            "A1",
            OrderStatus::Pending,
            OrderStatus::Paid,
            &[line(p, 5)],
            &stock,
            false,
        )
        .unwrap_err();
        match err {
            StatusChangeError::InsufficientStock { shortages } => {
                assert_eq!(shortages.len(), 1);
                assert_eq!(shortages[0].required, 5);
                assert_eq!(shortages[0].available, 2);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_pay_short_with_force_clamps_at_zero() {
        let p = Uuid::new_v4();
        let stock = HashMap::from([(p, 2)]);
        let plan = plan_status_change(
            "A1",
            OrderStatus::Cancelled,
            OrderStatus::Paid,
            &[line(p, 5)],
            &stock,
            true,
        )
        .unwrap();
        assert!(plan.forced());
        assert_eq!(plan.movements[0].quantity_change, -2);
        assert_eq!(plan.movements[0].resulting_balance, 0);
        assert!(plan.movements[0].note.contains("3 unit(s) short"));
    }

    #[test]
    fn test_repeated_product_lines_share_stock() {
        let p = Uuid::new_v4();
        let stock = HashMap::from([(p, 5)]);
        let err = plan_status_change(
            "A1",
            OrderStatus::Pending,
            OrderStatus::Paid,
            &[line(p, 3), line(p, 3)],
            &stock,
            false,
        )
        .unwrap_err();
        assert!(matches!(err, StatusChangeError::InsufficientStock { .. }));
    }

    #[test]
    fn test_cancel_paid_restocks() {
        let p = Uuid::new_v4();
        let stock = HashMap::from([(p, 1)]);
        let plan = plan_status_change(
            "A1",
            OrderStatus::Paid,
            OrderStatus::Cancelled,
            &[line(p, 4)],
            &stock,
            false,
        )
        .unwrap();
        assert_eq!(plan.movements[0].movement_type, MovementType::Entry);
        assert_eq!(plan.movements[0].resulting_balance, 5);
    }

    #[test]
    fn test_transitions_without_stock_effect() {
        let p = Uuid::new_v4();
        let stock = HashMap::from([(p, 1)]);
        for (from, to) in [
            (OrderStatus::Pending, OrderStatus::Cancelled),
            (OrderStatus::Cancelled, OrderStatus::Pending),
            (OrderStatus::Paid, OrderStatus::Pending),
            (OrderStatus::Paid, OrderStatus::Paid),
        ] {
            let plan =
                plan_status_change("A1", from, to, &[line(p, 4)], &stock, false).unwrap();
            assert!(plan.movements.is_empty(), "{from:?} -> {to:?}");
        }
    }

    #[test]
    fn test_deleted_product_lines_skipped() {
        let lines = [StockLine {
            product_id: None,
            product_name: "Gone".to_string(),
            quantity: 2,
        }];
        let plan = plan_status_change(
            "A1",
            OrderStatus::Pending,
            OrderStatus::Paid,
            &lines,
            &HashMap::new(),
            false,
        )
        .unwrap();
        assert!(plan.movements.is_empty());
    }

    #[test]
    fn test_missing_stock_snapshot_is_error() {
        let p = Uuid::new_v4();
        let err = plan_status_change(
            "A1",
            OrderStatus::Pending,
            OrderStatus::Paid,
            &[line(p, 1)],
            &HashMap::new(),
            false,
        )
        .unwrap_err();
        assert_eq!(err, StatusChangeError::MissingStock(p));
    }

    #[test]
    fn test_restock_beyond_limit_is_rejected() {
        let p = Uuid::new_v4();
        let stock = HashMap::from([(p, 10)]);
        let err = plan_status_change(
            "A1",
            OrderStatus::Paid,
            OrderStatus::Cancelled,
            &[line(p, i32::MAX)],
            &stock,
            false,
        )
        .unwrap_err();
        assert!(matches!(err, StatusChangeError::StockLimitExceeded { .. }));

        let at_limit = HashMap::from([(p, MAX_STOCK_QUANTITY - 4)]);
        let plan = plan_status_change(
            "A1",
            OrderStatus::Paid,
            OrderStatus::Cancelled,
            &[line(p, 4)],
            &at_limit,
            false,
        )
        .unwrap();
        assert_eq!(plan.movements[0].resulting_balance, MAX_STOCK_QUANTITY);
    }

    #[test]
    fn test_order_cost() {
        let item = OrderItem {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            product_id: None,
            product_name: "Mug".to_string(),
            unit_price: Decimal::new(1000, 2),
            unit_cost: Decimal::new(400, 2),
            quantity: 3,
        };
        assert_eq!(item.subtotal(), Decimal::new(3000, 2));
        assert_eq!(order_cost(&[item]), Decimal::new(1200, 2));
    }
}
