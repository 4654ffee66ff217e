//! Product catalog models and stock rules

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog item with price and stock quantity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub quantity: i32,
    pub image_path: Option<String>,
    pub min_stock: i32,
    pub ideal_stock: i32,
    /// Derived from `quantity` and `deactivated`, never set directly
    pub is_active: bool,
    /// Manual switch set by staff to hide a product that still has stock
    pub deactivated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Active flag for a product: out-of-stock products are never active.
pub fn derive_active(quantity: i32, deactivated: bool) -> bool {
    quantity > 0 && !deactivated
}

/// Storefront availability text for a stock quantity.
///
/// Below 50 the exact count is shown, up to 500 the count is rounded down to
/// a multiple of 50, and anything larger is capped.
pub fn availability_label(quantity: i32) -> String {
    if quantity < 50 {
        let plural = if quantity > 1 { "s" } else { "" };
        format!("Only {} unit{}", quantity, plural)
    } else if quantity < 500 {
        format!("+{} available", (quantity / 50) * 50)
    } else {
        "+500 available".to_string()
    }
}

/// Stock level used by the inventory dashboard
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    /// Below the minimum threshold
    Low,
    /// Between minimum and ideal, inclusive
    Medium,
    /// Above the ideal threshold
    High,
}

impl StockLevel {
    pub fn classify(quantity: i32, min_stock: i32, ideal_stock: i32) -> Self {
        if quantity < min_stock {
            StockLevel::Low
        } else if quantity <= ideal_stock {
            StockLevel::Medium
        } else {
            StockLevel::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockLevel::Low => "low",
            StockLevel::Medium => "medium",
            StockLevel::High => "high",
        }
    }
}

impl std::str::FromStr for StockLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(StockLevel::Low),
            "medium" => Ok(StockLevel::Medium),
            "high" => Ok(StockLevel::High),
            other => Err(format!("unknown stock level '{}'", other)),
        }
    }
}

/// Stock status buckets used by the product report.
///
/// Boundaries differ from [`StockLevel`]: the minimum bucket includes the
/// threshold itself.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    /// quantity <= min
    Minimum,
    /// min < quantity <= ideal
    Ideal,
    /// quantity > ideal
    Good,
}

impl StockStatus {
    pub fn classify(quantity: i32, min_stock: i32, ideal_stock: i32) -> Self {
        if quantity <= min_stock {
            StockStatus::Minimum
        } else if quantity <= ideal_stock {
            StockStatus::Ideal
        } else {
            StockStatus::Good
        }
    }
}

/// Fill percentage of the ideal stock, capped at 100.
///
/// A missing ideal (zero) is treated as one unit, so any stock reads as full.
pub fn stock_fill_percent(quantity: i32, ideal_stock: i32) -> i32 {
    let ideal = if ideal_stock > 0 { ideal_stock } else { 1 };
    let percent = (i64::from(quantity.max(0)) * 100) / i64::from(ideal);
    percent.min(100) as i32
}

/// Input for creating a product
#[derive(Debug, Clone, Serialize, Deserialize, validator::Validate)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    #[validate(range(min = 0, max = 1000000))]
    pub quantity: i32,
    #[serde(default)]
    #[validate(range(min = 0, max = 1000000))]
    pub min_stock: i32,
    #[serde(default)]
    #[validate(range(min = 0, max = 1000000))]
    pub ideal_stock: i32,
}

/// Input for updating a product; omitted fields keep their value
#[derive(Debug, Clone, Default, Serialize, Deserialize, validator::Validate)]
pub struct UpdateProductInput {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    #[validate(range(min = 0, max = 1000000))]
    pub quantity: Option<i32>,
    #[validate(range(min = 0, max = 1000000))]
    pub min_stock: Option<i32>,
    #[validate(range(min = 0, max = 1000000))]
    pub ideal_stock: Option<i32>,
    pub deactivated: Option<bool>,
}
