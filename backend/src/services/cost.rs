//! Product unit costs and their change history

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{cost_changed, CostHistoryEntry, CostHistoryRow, ProductMargin};
use shared::types::DateRange;

/// Cost service
#[derive(Clone)]
pub struct CostService {
    db: PgPool,
}

/// Product with its current cost and margin
#[derive(Debug, Clone, Serialize)]
pub struct ProductCost {
    pub product_id: Uuid,
    pub name: String,
    #[serde(flatten)]
    pub margin: ProductMargin,
}

#[derive(Debug, FromRow)]
struct ProductCostRow {
    product_id: Uuid,
    name: String,
    price: Decimal,
    unit_cost: Decimal,
}

impl From<ProductCostRow> for ProductCost {
    fn from(row: ProductCostRow) -> Self {
        Self {
            product_id: row.product_id,
            name: row.name,
            margin: ProductMargin::compute(row.price, row.unit_cost),
        }
    }
}

/// One submitted cost in a bulk update
#[derive(Debug, Clone, Deserialize)]
pub struct CostUpdate {
    pub product_id: Uuid,
    pub unit_cost: Decimal,
}

/// Result of a bulk cost update
#[derive(Debug, Clone, Serialize)]
pub struct CostUpdateSummary {
    pub updated: usize,
    pub unchanged: usize,
    pub products: Vec<ProductCost>,
}

/// Cost history listing filters; missing bounds fall back to the current month
#[derive(Debug, Default, Deserialize)]
pub struct CostHistoryFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub product_id: Option<Uuid>,
}

impl CostHistoryFilter {
    pub fn range(&self) -> DateRange {
        DateRange::or_month_of(self.start_date, self.end_date, Utc::now().date_naive())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CostHistoryPage {
    pub range: DateRange,
    pub entries: Vec<CostHistoryEntry>,
}

impl CostService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Every product with its cost, by name
    pub async fn list(&self) -> AppResult<Vec<ProductCost>> {
        let rows = sqlx::query_as::<_, ProductCostRow>(
            r#"
            SELECT p.id AS product_id, p.name, p.price, COALESCE(pc.unit_cost, 0) AS unit_cost
            FROM products p
            LEFT JOIN product_costs pc ON pc.product_id = p.id
            ORDER BY p.name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(ProductCost::from).collect())
    }

    /// Save several unit costs at once. History rows are written only for
    /// costs that actually changed.
    pub async fn update_costs(
        &self,
        updates: &[CostUpdate],
        changed_by: Uuid,
    ) -> AppResult<CostUpdateSummary> {
        for update in updates {
            shared::validate_money(update.unit_cost).map_err(|m| AppError::Validation {
                field: "unit_cost".to_string(),
                message: m.to_string(),
                message_pt: "Custo inválido".to_string(),
            })?;
        }

        let mut tx = self.db.begin().await?;
        let mut updated = 0;
        let mut unchanged = 0;
        let mut products = Vec::with_capacity(updates.len());

        for update in updates {
            let current = sqlx::query_as::<_, ProductCostRow>(
                r#"
                SELECT p.id AS product_id, p.name, p.price, COALESCE(pc.unit_cost, 0) AS unit_cost
                FROM products p
                LEFT JOIN product_costs pc ON pc.product_id = p.id
                WHERE p.id = $1
                FOR UPDATE OF p
                "#,
            )
            .bind(update.product_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {}", update.product_id)))?;

            if !cost_changed(current.unit_cost, update.unit_cost) {
                unchanged += 1;
                products.push(ProductCost::from(current));
                continue;
            }

            sqlx::query(
                r#"
                INSERT INTO product_costs (product_id, unit_cost, updated_at)
                VALUES ($1, $2, NOW())
                ON CONFLICT (product_id) DO UPDATE
                    SET unit_cost = EXCLUDED.unit_cost, updated_at = NOW()
                "#,
            )
            .bind(update.product_id)
            .bind(update.unit_cost)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                INSERT INTO cost_history (product_id, product_name, old_cost, new_cost, changed_by)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(update.product_id)
            .bind(&current.name)
            .bind(current.unit_cost)
            .bind(update.unit_cost)
            .bind(changed_by)
            .execute(&mut *tx)
            .await?;

            tracing::info!(
                product = %current.name,
                old_cost = %current.unit_cost,
                new_cost = %update.unit_cost,
                "Product cost changed"
            );

            updated += 1;
            products.push(ProductCost::from(ProductCostRow {
                unit_cost: update.unit_cost,
                ..current
            }));
        }

        tx.commit().await?;
        Ok(CostUpdateSummary {
            updated,
            unchanged,
            products,
        })
    }

    /// Cost changes inside the filter range, newest first
    pub async fn history(&self, filter: &CostHistoryFilter) -> AppResult<CostHistoryPage> {
        let range = filter.range();
        let rows = sqlx::query_as::<_, CostHistoryRow>(
            r#"
            SELECT ch.id, ch.product_id, ch.product_name, ch.old_cost, ch.new_cost,
                   ch.changed_by, u.username AS changed_by_username, ch.changed_at
            FROM cost_history ch
            LEFT JOIN users u ON u.id = ch.changed_by
            WHERE ch.changed_at::DATE BETWEEN $1 AND $2
              AND ($3::UUID IS NULL OR ch.product_id = $3)
            ORDER BY ch.changed_at DESC
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .bind(filter.product_id)
        .fetch_all(&self.db)
        .await?;

        Ok(CostHistoryPage {
            range,
            entries: rows.into_iter().map(CostHistoryEntry::from).collect(),
        })
    }
}
