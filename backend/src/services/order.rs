//! Order service: checkout, order queries and status transitions
//!
//! Every status change, single or bulk, goes through `apply_transition` so
//! stock debits, credits and ledger rows follow one set of rules.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    cart_total, generate_order_number, order_cost, plan_status_change, CartOwner, CheckoutInput,
    Order, OrderItem, OrderItemRow, OrderRow, OrderStatus, StockLine, StockMovement,
    StockShortage, ORDER_COLUMNS,
};
use crate::services::cart::{clear_cart, find_cart_id, load_lines};
use crate::services::inventory::record_movement;
use shared::types::{PaginatedResponse, Pagination};

/// Order service
#[derive(Clone)]
pub struct OrderService {
    db: PgPool,
}

/// Order with its frozen lines and cost figures
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub cost_total: Decimal,
    pub profit: Decimal,
}

impl OrderDetail {
    pub fn new(order: Order, items: Vec<OrderItem>) -> Self {
        let cost_total = order_cost(&items);
        let profit = order.total - cost_total;
        Self {
            order,
            items,
            cost_total,
            profit,
        }
    }
}

/// Status change request for one order
#[derive(Debug, Deserialize)]
pub struct StatusChangeInput {
    pub status: OrderStatus,
    /// Pay even when stock is short, clamping debits at zero
    #[serde(default)]
    pub force: bool,
}

/// Status change request for several orders
#[derive(Debug, Deserialize)]
pub struct BulkStatusChangeInput {
    pub order_ids: Vec<Uuid>,
    pub status: OrderStatus,
    #[serde(default)]
    pub force: bool,
}

/// Result of moving one order to a new status
#[derive(Debug, Clone, Serialize)]
pub struct TransitionOutcome {
    pub order_id: Uuid,
    pub order_number: String,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub movements: Vec<StockMovement>,
    /// Shortages overridden with `force`
    pub shortages: Vec<StockShortage>,
}

/// Admin order listing filters
#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// Matches order number or customer name
    pub q: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub min_total: Option<Decimal>,
    pub max_total: Option<Decimal>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl OrderFilter {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.per_page.unwrap_or(20).min(100))
    }

    fn search_pattern(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", q))
    }
}

/// Admin listing row with cost figures
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderSummary {
    pub id: Uuid,
    pub order_number: String,
    pub customer_name: String,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    pub total: Decimal,
    pub cost_total: Decimal,
    pub item_count: i64,
    pub created_at: chrono::DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct CheckoutLineRow {
    product_id: Uuid,
    name: String,
    is_active: bool,
    unit_cost: Decimal,
}

const ORDER_SUMMARY_SELECT: &str = r#"
    SELECT o.id, o.order_number, o.customer_name, o.status, o.total,
           COALESCE(SUM(oi.unit_cost * oi.quantity), 0) AS cost_total,
           COUNT(oi.id) AS item_count,
           o.created_at
    FROM orders o
    LEFT JOIN order_items oi ON oi.order_id = o.id
"#;

const ORDER_FILTER_WHERE: &str = r#"
    WHERE ($1::TEXT IS NULL OR o.status = $1)
      AND ($2::TEXT IS NULL OR o.order_number ILIKE $2 OR o.customer_name ILIKE $2)
      AND ($3::DATE IS NULL OR o.created_at::DATE >= $3)
      AND ($4::DATE IS NULL OR o.created_at::DATE <= $4)
      AND ($5::NUMERIC IS NULL OR o.total >= $5)
      AND ($6::NUMERIC IS NULL OR o.total <= $6)
"#;

impl OrderService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Turn the user's cart into a pending order and empty the cart.
    ///
    /// Line names, prices and unit costs are frozen on the order items.
    pub async fn checkout(&self, user_id: Uuid, input: &CheckoutInput) -> AppResult<OrderDetail> {
        let mut tx = self.db.begin().await?;

        let cart_id = find_cart_id(&mut tx, &CartOwner::User(user_id))
            .await?
            .ok_or(AppError::EmptyCart)?;
        let lines = load_lines(&mut tx, cart_id).await?;
        if lines.is_empty() {
            return Err(AppError::EmptyCart);
        }

        let product_ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
        let products: HashMap<Uuid, CheckoutLineRow> = sqlx::query_as::<_, CheckoutLineRow>(
            r#"
            SELECT p.id AS product_id, p.name, p.is_active,
                   COALESCE(pc.unit_cost, 0) AS unit_cost
            FROM products p
            LEFT JOIN product_costs pc ON pc.product_id = p.id
            WHERE p.id = ANY($1)
            "#,
        )
        .bind(&product_ids)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(|row| (row.product_id, row))
        .collect();

        for line in &lines {
            match products.get(&line.product_id) {
                Some(p) if p.is_active => {}
                Some(p) => return Err(AppError::ProductUnavailable(p.name.clone())),
                None => return Err(AppError::ProductUnavailable(line.product_name.clone())),
            }
        }

        let sequence = sqlx::query_scalar::<_, i64>("SELECT nextval('order_number_seq')")
            .fetch_one(&mut *tx)
            .await?;
        let order_number = generate_order_number(Utc::now().date_naive(), sequence);
        let total = cart_total(&lines);

        let order: Order = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            INSERT INTO orders
                (order_number, customer_id, status, total, customer_name, phone,
                 delivery_address, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(&order_number)
        .bind(user_id)
        .bind(OrderStatus::Pending.as_str())
        .bind(total)
        .bind(input.customer_name.trim())
        .bind(input.phone.trim())
        .bind(input.delivery_address.trim())
        .bind(input.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()))
        .fetch_one(&mut *tx)
        .await?
        .into();

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let frozen = &products[&line.product_id];
            let item = sqlx::query_as::<_, OrderItemRow>(
                r#"
                INSERT INTO order_items
                    (order_id, product_id, product_name, unit_price, unit_cost, quantity)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, order_id, product_id, product_name, unit_price, unit_cost, quantity
                "#,
            )
            .bind(order.id)
            .bind(line.product_id)
            .bind(&frozen.name)
            .bind(line.unit_price)
            .bind(frozen.unit_cost)
            .bind(line.quantity)
            .fetch_one(&mut *tx)
            .await?;
            items.push(OrderItem::from(item));
        }

        clear_cart(&mut tx, cart_id).await?;
        tx.commit().await?;

        tracing::info!(
            order = %order.order_number,
            total = %order.total,
            lines = items.len(),
            "Checkout completed"
        );
        Ok(OrderDetail::new(order, items))
    }

    /// A customer's own orders, newest first
    pub async fn list_for_customer(
        &self,
        customer_id: Uuid,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<Order>> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE customer_id = $1")
            .bind(customer_id)
            .fetch_one(&self.db)
            .await?;

        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            SELECT {} FROM orders
            WHERE customer_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            ORDER_COLUMNS
        ))
        .bind(customer_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: rows.into_iter().map(Order::from).collect(),
            pagination: pagination.meta(total.max(0) as u64),
        })
    }

    /// One of the customer's own orders
    pub async fn get_for_customer(&self, customer_id: Uuid, order_id: Uuid) -> AppResult<OrderDetail> {
        let detail = self.get(order_id).await?;
        if detail.order.customer_id != Some(customer_id) {
            return Err(AppError::NotFound("Order".to_string()));
        }
        Ok(detail)
    }

    pub async fn get(&self, order_id: Uuid) -> AppResult<OrderDetail> {
        let order: Order = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE id = $1",
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?
        .into();

        let mut conn = self.db.acquire().await?;
        let items = load_items(&mut conn, order_id).await?;
        Ok(OrderDetail::new(order, items))
    }

    /// Back-office listing, newest first
    pub async fn list_admin(&self, filter: &OrderFilter) -> AppResult<PaginatedResponse<OrderSummary>> {
        let pagination = filter.pagination();
        let status = filter.status.map(|s| s.as_str());
        let q = filter.search_pattern();

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM orders o {}",
            ORDER_FILTER_WHERE
        ))
        .bind(status)
        .bind(&q)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(filter.min_total)
        .bind(filter.max_total)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, OrderSummary>(&format!(
            "{} {} GROUP BY o.id ORDER BY o.created_at DESC LIMIT $7 OFFSET $8",
            ORDER_SUMMARY_SELECT, ORDER_FILTER_WHERE
        ))
        .bind(status)
        .bind(&q)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(filter.min_total)
        .bind(filter.max_total)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: rows,
            pagination: pagination.meta(total.max(0) as u64),
        })
    }

    /// Every order matching the filter, newest first, for report export
    pub async fn all_admin(&self, filter: &OrderFilter) -> AppResult<Vec<OrderSummary>> {
        let rows = sqlx::query_as::<_, OrderSummary>(&format!(
            "{} {} GROUP BY o.id ORDER BY o.created_at DESC",
            ORDER_SUMMARY_SELECT, ORDER_FILTER_WHERE
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.search_pattern())
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(filter.min_total)
        .bind(filter.max_total)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Change the status of one order
    pub async fn change_status(
        &self,
        order_id: Uuid,
        input: &StatusChangeInput,
        acting_user: Uuid,
    ) -> AppResult<TransitionOutcome> {
        let mut tx = self.db.begin().await?;
        let outcome =
            apply_transition(&mut tx, order_id, input.status, input.force, acting_user).await?;
        tx.commit().await?;
        Ok(outcome)
    }

    /// Change the status of several orders in one transaction.
    ///
    /// A shortage on any order without `force` rolls back the whole batch.
    pub async fn bulk_change_status(
        &self,
        input: &BulkStatusChangeInput,
        acting_user: Uuid,
    ) -> AppResult<Vec<TransitionOutcome>> {
        if input.order_ids.is_empty() {
            return Err(AppError::Validation {
                field: "order_ids".to_string(),
                message: "Select at least one order".to_string(),
                message_pt: "Selecione pelo menos um pedido".to_string(),
            });
        }

        let mut order_ids = input.order_ids.clone();
        order_ids.sort();
        order_ids.dedup();

        let mut tx = self.db.begin().await?;
        let mut outcomes = Vec::with_capacity(order_ids.len());
        for order_id in order_ids {
            let outcome =
                apply_transition(&mut tx, order_id, input.status, input.force, acting_user).await?;
            outcomes.push(outcome);
        }
        tx.commit().await?;

        tracing::info!(
            count = outcomes.len(),
            status = %input.status,
            "Bulk order status change applied"
        );
        Ok(outcomes)
    }
}

async fn load_items(conn: &mut PgConnection, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
    let rows = sqlx::query_as::<_, OrderItemRow>(
        r#"
        SELECT id, order_id, product_id, product_name, unit_price, unit_cost, quantity
        FROM order_items WHERE order_id = $1
        ORDER BY product_name, id
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(OrderItem::from).collect())
}

/// Move one order to `to` inside the caller's transaction.
///
/// The order row and every product it references are locked before stock
/// is read, products in id order, so concurrent transitions on the same
/// stock serialize instead of overwriting each other.
pub async fn apply_transition(
    conn: &mut PgConnection,
    order_id: Uuid,
    to: OrderStatus,
    force: bool,
    acting_user: Uuid,
) -> AppResult<TransitionOutcome> {
    let order: Order = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {} FROM orders WHERE id = $1 FOR UPDATE",
        ORDER_COLUMNS
    ))
    .bind(order_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Order {}", order_id)))?
    .into();

    let items = load_items(conn, order_id).await?;
    let lines: Vec<StockLine> = items.iter().map(StockLine::from).collect();

    let mut product_ids: Vec<Uuid> = lines.iter().filter_map(|l| l.product_id).collect();
    product_ids.sort();
    product_ids.dedup();

    let locked = sqlx::query_as::<_, (Uuid, String, i32)>(
        "SELECT id, name, quantity FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE",
    )
    .bind(&product_ids)
    .fetch_all(&mut *conn)
    .await?;

    let stock: HashMap<Uuid, i32> = locked.iter().map(|(id, _, qty)| (*id, *qty)).collect();
    let names: HashMap<Uuid, &str> = locked
        .iter()
        .map(|(id, name, _)| (*id, name.as_str()))
        .collect();

    // Lines whose product vanished between checkout and now are skipped
    let lines: Vec<StockLine> = lines
        .into_iter()
        .filter(|l| l.product_id.map_or(false, |id| stock.contains_key(&id)))
        .collect();

    let plan = match plan_status_change(&order.order_number, order.status, to, &lines, &stock, force)
    {
        Ok(plan) => plan,
        Err(e) => {
            tracing::warn!(order = %order.order_number, to = %to, "Status change rejected: {}", e);
            return Err(e.into());
        }
    };

    let mut movements = Vec::with_capacity(plan.movements.len());
    for (product_id, balance) in plan.final_balances() {
        sqlx::query("UPDATE products SET quantity = $2, updated_at = NOW() WHERE id = $1")
            .bind(product_id)
            .bind(balance)
            .execute(&mut *conn)
            .await?;
    }
    for planned in &plan.movements {
        let name = names.get(&planned.product_id).copied().unwrap_or_default();
        let movement =
            record_movement(conn, planned, name, Some(order.id), Some(acting_user)).await?;
        movements.push(movement);
    }

    if !plan.is_noop() {
        sqlx::query("UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(order.id)
            .bind(to.as_str())
            .execute(&mut *conn)
            .await?;
    }

    if plan.forced() {
        tracing::warn!(
            order = %order.order_number,
            shortages = plan.shortages.len(),
            "Order paid with insufficient stock (forced)"
        );
    } else {
        tracing::info!(order = %order.order_number, from = %plan.from, to = %to, "Order status changed");
    }

    Ok(TransitionOutcome {
        order_id: order.id,
        order_number: order.order_number,
        from: plan.from,
        to,
        movements,
        shortages: plan.shortages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_detail_profit() {
        let order_id = Uuid::new_v4();
        let order = Order {
            id: order_id,
            order_number: "ORD-20261018-000007".to_string(),
            customer_id: None,
            status: OrderStatus::Paid,
            total: Decimal::new(2500, 2),
            customer_name: "Ana".to_string(),
            phone: "11987654321".to_string(),
            delivery_address: "Rua A, 10".to_string(),
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let items = vec![OrderItem {
            id: Uuid::new_v4(),
            order_id,
            product_id: None,
            product_name: "Brownie".to_string(),
            unit_price: Decimal::new(1250, 2),
            unit_cost: Decimal::new(500, 2),
            quantity: 2,
        }];
        let detail = OrderDetail::new(order, items);
        assert_eq!(detail.cost_total, Decimal::new(1000, 2));
        assert_eq!(detail.profit, Decimal::new(1500, 2));
    }

    #[test]
    fn test_status_input_force_defaults_false() {
        let input: StatusChangeInput = serde_json::from_str(r#"{"status": "paid"}"#).unwrap();
        assert_eq!(input.status, OrderStatus::Paid);
        assert!(!input.force);
    }

    #[test]
    fn test_filter_pagination_default() {
        let filter = OrderFilter::default();
        assert_eq!(filter.pagination().per_page, 20);
    }
}
