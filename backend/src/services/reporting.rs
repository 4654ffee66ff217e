//! Reporting service for financial analytics, catalog reports and data export

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    daily_rows, monthly_series, profit_series, summarize, DailyFinancialRow, DailySort,
    ExpenseFigures, ExpenseType, FinancialTotals, MonthlyPoint, OrderFigures, ProfitSeries,
    StockStatus,
};
use shared::types::DateRange;

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    db: PgPool,
}

/// Date range filter shared by the financial reports
#[derive(Debug, Default, Deserialize)]
pub struct FinancialReportFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub sort: Option<DailySort>,
}

impl FinancialReportFilter {
    /// Missing bounds fall back to the current month
    pub fn range(&self) -> DateRange {
        DateRange::or_month_of(self.start_date, self.end_date, Utc::now().date_naive())
    }
}

/// Financial dashboard for a period
#[derive(Debug, Serialize)]
pub struct FinancialSummary {
    pub range: DateRange,
    #[serde(flatten)]
    pub totals: FinancialTotals,
    pub monthly: Vec<MonthlyPoint>,
    pub profit: ProfitSeries,
}

/// Revenue, cost and profit of one paid order
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct PaidOrderFinancials {
    pub order_id: Uuid,
    pub order_number: String,
    pub customer_name: String,
    pub date: NaiveDate,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
}

/// Product report row
#[derive(Debug, Serialize)]
pub struct ProductReportRow {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub unit_cost: Decimal,
    pub quantity: i32,
    pub min_stock: i32,
    pub ideal_stock: i32,
    pub status: StockStatus,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct ProductReportQueryRow {
    id: Uuid,
    name: String,
    price: Decimal,
    unit_cost: Decimal,
    quantity: i32,
    min_stock: i32,
    ideal_stock: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<ProductReportQueryRow> for ProductReportRow {
    fn from(row: ProductReportQueryRow) -> Self {
        Self {
            status: StockStatus::classify(row.quantity, row.min_stock, row.ideal_stock),
            id: row.id,
            name: row.name,
            price: row.price,
            unit_cost: row.unit_cost,
            quantity: row.quantity,
            min_stock: row.min_stock,
            ideal_stock: row.ideal_stock,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

/// Product report ordering
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProductOrdering {
    #[default]
    Name,
    Price,
    Quantity,
    Recent,
}

impl ProductOrdering {
    fn sql(&self) -> &'static str {
        match self {
            ProductOrdering::Name => "p.name ASC",
            ProductOrdering::Price => "p.price ASC, p.name ASC",
            ProductOrdering::Quantity => "p.quantity ASC, p.name ASC",
            ProductOrdering::Recent => "p.created_at DESC",
        }
    }
}

/// Product report filters
#[derive(Debug, Default, Deserialize)]
pub struct ProductReportFilter {
    pub q: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub min_quantity: Option<i32>,
    pub max_quantity: Option<i32>,
    pub status: Option<StockStatus>,
    pub order: Option<ProductOrdering>,
}

/// Back-office dashboard cards
#[derive(Debug, Serialize)]
pub struct DashboardMetrics {
    pub total_products: i64,
    pub low_stock_products: i64,
    pub pending_orders: i64,
    pub paid_revenue_this_month: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderFigureRow {
    date: NaiveDate,
    revenue: Decimal,
    cost: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct ExpenseFigureRow {
    date: NaiveDate,
    #[sqlx(try_from = "String")]
    expense_type: ExpenseType,
    amount: Decimal,
}

impl ReportingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Totals, monthly series and profit chart for the filter range
    pub async fn financial_summary(
        &self,
        filter: &FinancialReportFilter,
    ) -> AppResult<FinancialSummary> {
        let range = filter.range();
        let orders = self.order_figures(&range).await?;
        let expenses = self.expense_figures(&range).await?;

        Ok(FinancialSummary {
            range,
            totals: summarize(&orders, &expenses),
            monthly: monthly_series(&orders, &expenses),
            profit: profit_series(&range, &orders, &expenses),
        })
    }

    /// Per-day figures for the filter range
    pub async fn daily_financials(
        &self,
        filter: &FinancialReportFilter,
    ) -> AppResult<Vec<DailyFinancialRow>> {
        let range = filter.range();
        let orders = self.order_figures(&range).await?;
        let expenses = self.expense_figures(&range).await?;
        Ok(daily_rows(&orders, &expenses, filter.sort.unwrap_or_default()))
    }

    /// Paid orders in the range with their cost and profit, newest first
    pub async fn paid_order_financials(
        &self,
        filter: &FinancialReportFilter,
    ) -> AppResult<Vec<PaidOrderFinancials>> {
        let range = filter.range();
        let rows = sqlx::query_as::<_, PaidOrderFinancials>(
            r#"
            SELECT o.id AS order_id, o.order_number, o.customer_name,
                   o.created_at::DATE AS date,
                   o.total AS revenue,
                   COALESCE(SUM(oi.unit_cost * oi.quantity), 0) AS cost,
                   o.total - COALESCE(SUM(oi.unit_cost * oi.quantity), 0) AS profit
            FROM orders o
            LEFT JOIN order_items oi ON oi.order_id = o.id
            WHERE o.status = 'paid'
              AND o.created_at::DATE BETWEEN $1 AND $2
            GROUP BY o.id
            ORDER BY o.created_at DESC
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Product catalog report
    pub async fn product_report(&self, filter: &ProductReportFilter) -> AppResult<Vec<ProductReportRow>> {
        let pattern = filter
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", q));
        let order = filter.order.unwrap_or_default();

        let rows = sqlx::query_as::<_, ProductReportQueryRow>(&format!(
            r#"
            SELECT p.id, p.name, p.price, COALESCE(pc.unit_cost, 0) AS unit_cost,
                   p.quantity, p.min_stock, p.ideal_stock, p.is_active, p.created_at
            FROM products p
            LEFT JOIN product_costs pc ON pc.product_id = p.id
            WHERE ($1::TEXT IS NULL OR p.name ILIKE $1)
              AND ($2::NUMERIC IS NULL OR p.price >= $2)
              AND ($3::NUMERIC IS NULL OR p.price <= $3)
              AND ($4::INTEGER IS NULL OR p.quantity >= $4)
              AND ($5::INTEGER IS NULL OR p.quantity <= $5)
            ORDER BY {}
            "#,
            order.sql()
        ))
        .bind(&pattern)
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(filter.min_quantity)
        .bind(filter.max_quantity)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(ProductReportRow::from)
            .filter(|row| filter.status.map_or(true, |s| row.status == s))
            .collect())
    }

    /// Get dashboard metrics
    pub async fn get_dashboard_metrics(&self) -> AppResult<DashboardMetrics> {
        let (total_products, low_stock_products): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE quantity < min_stock) AS low
            FROM products
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        let pending_orders: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE status = 'pending'")
                .fetch_one(&self.db)
                .await?;

        let month = DateRange::month_of(Utc::now().date_naive());
        let paid_revenue_this_month: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(total), 0) FROM orders
            WHERE status = 'paid' AND created_at::DATE BETWEEN $1 AND $2
            "#,
        )
        .bind(month.start)
        .bind(month.end)
        .fetch_one(&self.db)
        .await?;

        Ok(DashboardMetrics {
            total_products,
            low_stock_products,
            pending_orders,
            paid_revenue_this_month,
        })
    }

    async fn order_figures(&self, range: &DateRange) -> AppResult<Vec<OrderFigures>> {
        let rows = sqlx::query_as::<_, OrderFigureRow>(
            r#"
            SELECT o.created_at::DATE AS date,
                   o.total AS revenue,
                   COALESCE(SUM(oi.unit_cost * oi.quantity), 0) AS cost
            FROM orders o
            LEFT JOIN order_items oi ON oi.order_id = o.id
            WHERE o.status = 'paid'
              AND o.created_at::DATE BETWEEN $1 AND $2
            GROUP BY o.id
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| OrderFigures {
                date: r.date,
                revenue: r.revenue,
                cost: r.cost,
            })
            .collect())
    }

    async fn expense_figures(&self, range: &DateRange) -> AppResult<Vec<ExpenseFigures>> {
        let rows = sqlx::query_as::<_, ExpenseFigureRow>(
            "SELECT date, expense_type, amount FROM expenses WHERE date BETWEEN $1 AND $2",
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| ExpenseFigures {
                date: r.date,
                expense_type: r.expense_type,
                amount: r.amount,
            })
            .collect())
    }

    /// Export report data as CSV
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        name: &'static str,
        amount: Decimal,
        status: StockStatus,
        note: Option<&'static str>,
    }

    #[test]
    fn test_export_to_csv_writes_header_and_rows() {
        let rows = [
            Row {
                name: "Brownie",
                amount: Decimal::new(1250, 2),
                status: StockStatus::Good,
                note: None,
            },
            Row {
                name: "Cookie, large",
                amount: Decimal::new(500, 2),
                status: StockStatus::Minimum,
                note: Some("restock"),
            },
        ];
        let csv = ReportingService::export_to_csv(&rows).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "name,amount,status,note");
        assert_eq!(lines[1], "Brownie,12.50,good,");
        assert_eq!(lines[2], "\"Cookie, large\",5.00,minimum,restock");
    }

    #[test]
    fn test_export_empty_is_empty() {
        let rows: Vec<Row> = Vec::new();
        assert_eq!(ReportingService::export_to_csv(&rows).unwrap(), "");
    }

    #[test]
    fn test_product_ordering_sql() {
        assert_eq!(ProductOrdering::default().sql(), "p.name ASC");
        assert_eq!(ProductOrdering::Recent.sql(), "p.created_at DESC");
    }

    #[test]
    fn test_financial_filter_range_defaults_to_month() {
        let range = FinancialReportFilter::default().range();
        assert!(range.is_single_month());
    }
}
