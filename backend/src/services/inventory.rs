//! Inventory service for stock levels, limits and the movement ledger

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    plan_manual_movement, stock_fill_percent, ManualMovementInput, MovementType,
    PlannedMovement, StockLevel, StockMovement, StockMovementRow,
};
use shared::types::{PaginatedResponse, Pagination};

/// Inventory service for stock dashboards and manual movements
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
}

/// Dashboard row for one product
#[derive(Debug, Clone, Serialize)]
pub struct StockOverviewRow {
    pub id: Uuid,
    pub name: String,
    pub quantity: i32,
    /// Share of the ideal stock on hand, capped at 100
    pub fill_percent: i32,
    pub level: StockLevel,
    pub min_stock: i32,
    pub ideal_stock: i32,
    pub last_movement_at: Option<DateTime<Utc>>,
}

/// Inventory dashboard
#[derive(Debug, Clone, Serialize)]
pub struct StockOverview {
    pub total_products: usize,
    pub below_minimum: usize,
    pub last_movement_at: Option<DateTime<Utc>>,
    pub products: Vec<StockOverviewRow>,
}

/// Dashboard filters
#[derive(Debug, Default, Deserialize)]
pub struct StockOverviewFilter {
    pub q: Option<String>,
    pub level: Option<StockLevel>,
}

/// New thresholds for one product
#[derive(Debug, Clone, Deserialize)]
pub struct StockLimitUpdate {
    pub product_id: Uuid,
    pub min_stock: i32,
    pub ideal_stock: i32,
}

/// Saved thresholds echoed back to the client
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockLimitSaved {
    pub id: Uuid,
    pub min_stock: i32,
    pub ideal_stock: i32,
    pub last_movement_at: Option<DateTime<Utc>>,
}

/// Movement ledger filters
#[derive(Debug, Default, Deserialize)]
pub struct MovementFilter {
    pub product_id: Option<Uuid>,
    pub product: Option<String>,
    pub movement_type: Option<MovementType>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, FromRow)]
struct OverviewQueryRow {
    id: Uuid,
    name: String,
    quantity: i32,
    min_stock: i32,
    ideal_stock: i32,
    last_movement_at: Option<DateTime<Utc>>,
}

const MOVEMENT_COLUMNS: &str = "id, product_id, product_name, movement_type, quantity_change, \
     resulting_balance, note, order_id, created_by, created_at";

/// Append a ledger row. Runs on the caller's connection so it commits with
/// the quantity change it describes.
pub async fn record_movement(
    conn: &mut PgConnection,
    movement: &PlannedMovement,
    product_name: &str,
    order_id: Option<Uuid>,
    created_by: Option<Uuid>,
) -> AppResult<StockMovement> {
    let row = sqlx::query_as::<_, StockMovementRow>(&format!(
        r#"
        INSERT INTO stock_movements
            (product_id, product_name, movement_type, quantity_change, resulting_balance,
             note, order_id, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {}
        "#,
        MOVEMENT_COLUMNS
    ))
    .bind(movement.product_id)
    .bind(product_name)
    .bind(movement.movement_type.as_str())
    .bind(movement.quantity_change)
    .bind(movement.resulting_balance)
    .bind(&movement.note)
    .bind(order_id)
    .bind(created_by)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row.into())
}

impl InventoryService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Stock dashboard with cards and per-product table
    pub async fn get_overview(&self, filter: &StockOverviewFilter) -> AppResult<StockOverview> {
        let search = filter
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", q));

        let rows = sqlx::query_as::<_, OverviewQueryRow>(
            r#"
            SELECT p.id, p.name, p.quantity, p.min_stock, p.ideal_stock,
                   (SELECT MAX(sm.created_at) FROM stock_movements sm WHERE sm.product_id = p.id)
                       AS last_movement_at
            FROM products p
            WHERE ($1::TEXT IS NULL OR p.name ILIKE $1)
            ORDER BY p.name
            "#,
        )
        .bind(search)
        .fetch_all(&self.db)
        .await?;

        let products: Vec<StockOverviewRow> = rows
            .into_iter()
            .map(|r| StockOverviewRow {
                level: StockLevel::classify(r.quantity, r.min_stock, r.ideal_stock),
                fill_percent: stock_fill_percent(r.quantity, r.ideal_stock),
                id: r.id,
                name: r.name,
                quantity: r.quantity,
                min_stock: r.min_stock,
                ideal_stock: r.ideal_stock,
                last_movement_at: r.last_movement_at,
            })
            .filter(|r| filter.level.map_or(true, |level| r.level == level))
            .collect();

        let last_movement_at =
            sqlx::query_scalar::<_, Option<DateTime<Utc>>>("SELECT MAX(created_at) FROM stock_movements")
                .fetch_one(&self.db)
                .await?;

        Ok(StockOverview {
            total_products: products.len(),
            below_minimum: products
                .iter()
                .filter(|p| p.level == StockLevel::Low)
                .count(),
            last_movement_at,
            products,
        })
    }

    /// Save min/ideal thresholds for several products at once
    pub async fn update_limits(
        &self,
        updates: &[StockLimitUpdate],
    ) -> AppResult<Vec<StockLimitSaved>> {
        for update in updates {
            shared::validate_stock_limits(update.min_stock, update.ideal_stock).map_err(|m| {
                AppError::Validation {
                    field: format!("limits.{}", update.product_id),
                    message: m.to_string(),
                    message_pt: "O estoque mínimo não pode ser maior que o ideal".to_string(),
                }
            })?;
        }

        let mut tx = self.db.begin().await?;
        let mut saved = Vec::with_capacity(updates.len());

        for update in updates {
            let row = sqlx::query_as::<_, StockLimitSaved>(
                r#"
                UPDATE products p
                SET min_stock = $2, ideal_stock = $3, updated_at = NOW()
                WHERE p.id = $1
                RETURNING p.id, p.min_stock, p.ideal_stock,
                    (SELECT MAX(sm.created_at) FROM stock_movements sm WHERE sm.product_id = p.id)
                        AS last_movement_at
                "#,
            )
            .bind(update.product_id)
            .bind(update.min_stock)
            .bind(update.ideal_stock)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {}", update.product_id)))?;
            saved.push(row);
        }

        tx.commit().await?;
        tracing::info!(count = saved.len(), "Stock limits updated");
        Ok(saved)
    }

    /// Record a staff-entered entry, exit or adjustment
    pub async fn record_manual_movement(
        &self,
        product_id: Uuid,
        input: &ManualMovementInput,
        created_by: Uuid,
    ) -> AppResult<StockMovement> {
        let mut tx = self.db.begin().await?;

        let (name, quantity) = sqlx::query_as::<_, (String, i32)>(
            "SELECT name, quantity FROM products WHERE id = $1 FOR UPDATE",
        )
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let planned = plan_manual_movement(product_id, quantity, input)?;

        sqlx::query("UPDATE products SET quantity = $2, updated_at = NOW() WHERE id = $1")
            .bind(product_id)
            .bind(planned.resulting_balance)
            .execute(&mut *tx)
            .await?;

        let movement = record_movement(&mut *tx, &planned, &name, None, Some(created_by)).await?;
        tx.commit().await?;

        tracing::info!(
            product_id = %product_id,
            movement_type = %planned.movement_type,
            change = planned.quantity_change,
            "Manual stock movement recorded"
        );
        Ok(movement)
    }

    /// Ledger listing, newest first
    pub async fn list_movements(
        &self,
        filter: &MovementFilter,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<StockMovement>> {
        let product = filter
            .product
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| format!("%{}%", p));
        let movement_type = filter.movement_type.map(|t| t.as_str());

        const WHERE: &str = r#"
            WHERE ($1::UUID IS NULL OR product_id = $1)
              AND ($2::TEXT IS NULL OR product_name ILIKE $2)
              AND ($3::TEXT IS NULL OR movement_type = $3)
              AND ($4::DATE IS NULL OR created_at::DATE >= $4)
              AND ($5::DATE IS NULL OR created_at::DATE <= $5)
        "#;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM stock_movements {}",
            WHERE
        ))
        .bind(filter.product_id)
        .bind(&product)
        .bind(movement_type)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, StockMovementRow>(&format!(
            "SELECT {} FROM stock_movements {} ORDER BY created_at DESC LIMIT $6 OFFSET $7",
            MOVEMENT_COLUMNS, WHERE
        ))
        .bind(filter.product_id)
        .bind(&product)
        .bind(movement_type)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: rows.into_iter().map(StockMovement::from).collect(),
            pagination: pagination.meta(total.max(0) as u64),
        })
    }

    /// Full ledger for export, newest first
    pub async fn all_movements(&self, filter: &MovementFilter) -> AppResult<Vec<StockMovement>> {
        let everything = Pagination::new(Some(1), u32::MAX);
        Ok(self.list_movements(filter, &everything).await?.data)
    }
}
