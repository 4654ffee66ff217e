//! Database models for the storefront
//!
//! Re-exports models from the shared crate and adds the row types sqlx
//! decodes into before they are converted to shared models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

pub use shared::models::*;

/// Columns selected for a `ProductRow`
pub const PRODUCT_COLUMNS: &str = "id, name, description, price, quantity, image_path, \
     min_stock, ideal_stock, is_active, deactivated, created_at, updated_at";

#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub quantity: i32,
    pub image_path: Option<String>,
    pub min_stock: i32,
    pub ideal_stock: i32,
    pub is_active: bool,
    pub deactivated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            quantity: row.quantity,
            image_path: row.image_path,
            min_stock: row.min_stock,
            ideal_stock: row.ideal_stock,
            is_active: row.is_active,
            deactivated: row.deactivated,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Columns selected for an `OrderRow`
pub const ORDER_COLUMNS: &str = "id, order_number, customer_id, status, total, customer_name, \
     phone, delivery_address, notes, created_at, updated_at";

#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Option<Uuid>,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    pub total: Decimal,
    pub customer_name: String,
    pub phone: String,
    pub delivery_address: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Order {
            id: row.id,
            order_number: row.order_number,
            customer_id: row.customer_id,
            status: row.status,
            total: row.total,
            customer_name: row.customer_name,
            phone: row.phone,
            delivery_address: row.delivery_address,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub unit_price: Decimal,
    pub unit_cost: Decimal,
    pub quantity: i32,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            product_name: row.product_name,
            unit_price: row.unit_price,
            unit_cost: row.unit_cost,
            quantity: row.quantity,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct StockMovementRow {
    pub id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    #[sqlx(try_from = "String")]
    pub movement_type: MovementType,
    pub quantity_change: i32,
    pub resulting_balance: i32,
    pub note: String,
    pub order_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<StockMovementRow> for StockMovement {
    fn from(row: StockMovementRow) -> Self {
        StockMovement {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            movement_type: row.movement_type,
            quantity_change: row.quantity_change,
            resulting_balance: row.resulting_balance,
            note: row.note,
            order_id: row.order_id,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct FeedbackRow {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub username: Option<String>,
    pub product_id: Option<Uuid>,
    pub product_name: Option<String>,
    pub order_id: Option<Uuid>,
    pub rating: i16,
    pub comment: String,
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
}

impl From<FeedbackRow> for Feedback {
    fn from(row: FeedbackRow) -> Self {
        Feedback {
            id: row.id,
            user_id: row.user_id,
            username: row.username,
            product_id: row.product_id,
            product_name: row.product_name,
            order_id: row.order_id,
            rating: row.rating,
            comment: row.comment,
            is_visible: row.is_visible,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ExpenseRow {
    pub id: Uuid,
    pub category: String,
    #[sqlx(try_from = "String")]
    pub expense_type: ExpenseType,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub supplier: Option<String>,
    pub installments: i32,
    pub created_at: DateTime<Utc>,
}

impl From<ExpenseRow> for Expense {
    fn from(row: ExpenseRow) -> Self {
        Expense {
            id: row.id,
            category: row.category,
            expense_type: row.expense_type,
            amount: row.amount,
            date: row.date,
            description: row.description,
            supplier: row.supplier,
            installments: row.installments,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct FinancialEntryRow {
    pub id: Uuid,
    #[sqlx(try_from = "String")]
    pub entry_type: EntryType,
    pub category: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub installments: i32,
    pub created_at: DateTime<Utc>,
}

impl From<FinancialEntryRow> for FinancialEntry {
    fn from(row: FinancialEntryRow) -> Self {
        FinancialEntry {
            id: row.id,
            entry_type: row.entry_type,
            category: row.category,
            amount: row.amount,
            date: row.date,
            description: row.description,
            installments: row.installments,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct CostHistoryRow {
    pub id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub old_cost: Decimal,
    pub new_cost: Decimal,
    pub changed_by: Option<Uuid>,
    pub changed_by_username: Option<String>,
    pub changed_at: DateTime<Utc>,
}

impl From<CostHistoryRow> for CostHistoryEntry {
    fn from(row: CostHistoryRow) -> Self {
        CostHistoryEntry {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            old_cost: row.old_cost,
            new_cost: row.new_cost,
            changed_by: row.changed_by,
            changed_by_username: row.changed_by_username,
            changed_at: row.changed_at,
        }
    }
}
