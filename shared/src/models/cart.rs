//! Shopping cart models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::validation::MAX_LINE_QUANTITY;

/// Who a cart belongs to: a signed-in user or an anonymous session key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum CartOwner {
    User(Uuid),
    Session(String),
}

/// A cart line with the unit price frozen when the product was added
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub image_path: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

impl CartLine {
    pub fn new(
        id: Uuid,
        product_id: Uuid,
        product_name: String,
        image_path: Option<String>,
        unit_price: Decimal,
        quantity: i32,
    ) -> Self {
        Self {
            id,
            product_id,
            product_name,
            image_path,
            unit_price,
            quantity,
            line_total: line_total(unit_price, quantity),
        }
    }
}

/// Cart contents with totals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartView {
    pub cart_id: Option<Uuid>,
    pub items: Vec<CartLine>,
    pub item_count: i64,
    pub total: Decimal,
}

impl CartView {
    pub fn from_lines(cart_id: Option<Uuid>, items: Vec<CartLine>) -> Self {
        let total = cart_total(&items);
        let item_count = items.iter().map(|i| i64::from(i.quantity)).sum();
        Self {
            cart_id,
            items,
            item_count,
            total,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

pub fn cart_total(lines: &[CartLine]) -> Decimal {
    lines
        .iter()
        .map(|l| line_total(l.unit_price, l.quantity))
        .sum()
}

/// Cart rule violations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("quantity must be at least 1")]
    InvalidQuantity,
    #[error("quantity cannot exceed {max} per product")]
    QuantityTooLarge { max: i32 },
    #[error("product is not available")]
    ProductUnavailable,
    #[error("cart is empty")]
    Empty,
}

/// Quantity after adding `added` units to a line already holding `existing`.
///
/// The frozen unit price of an existing line is kept. A line never holds
/// more than [`MAX_LINE_QUANTITY`] units.
pub fn merged_quantity(existing: Option<i32>, added: i32) -> Result<i32, CartError> {
    if added < 1 {
        return Err(CartError::InvalidQuantity);
    }
    existing
        .unwrap_or(0)
        .checked_add(added)
        .filter(|total| *total <= MAX_LINE_QUANTITY)
        .ok_or(CartError::QuantityTooLarge {
            max: MAX_LINE_QUANTITY,
        })
}

/// What to do with a line when its quantity is set explicitly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    Set(i32),
    Remove,
}

impl QuantityChange {
    pub fn from_requested(quantity: i32) -> Self {
        if quantity <= 0 {
            QuantityChange::Remove
        } else {
            QuantityChange::Set(quantity)
        }
    }
}
