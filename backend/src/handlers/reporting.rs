//! Reporting handlers for analytics and data export
//!
//! Every report answers JSON by default and CSV with `?format=csv`.

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::services::feedback::FeedbackFilter;
use crate::services::inventory::MovementFilter;
use crate::services::order::OrderFilter;
use crate::services::reporting::{
    DashboardMetrics, FinancialReportFilter, ProductReportFilter, ReportingService,
};
use crate::services::{FeedbackService, InventoryService, OrderService};
use crate::AppState;

#[derive(Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>, // "json" or "csv"
}

impl ExportQuery {
    fn is_csv(&self) -> bool {
        self.format.as_deref() == Some("csv")
    }
}

fn report_response<T: Serialize>(data: Vec<T>, export: &ExportQuery, filename: &str) -> AppResult<Response> {
    if export.is_csv() {
        let csv = ReportingService::export_to_csv(&data)?;
        let disposition = format!("attachment; filename=\"{}.csv\"", filename);
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            csv,
        )
            .into_response())
    } else {
        Ok(Json(data).into_response())
    }
}

/// Get dashboard metrics
pub async fn get_dashboard(State(state): State<AppState>) -> AppResult<Json<DashboardMetrics>> {
    let service = ReportingService::new(state.db.clone());
    Ok(Json(service.get_dashboard_metrics().await?))
}

/// Financial summary; the CSV export carries the headline totals
pub async fn get_financial_summary(
    State(state): State<AppState>,
    Query(filter): Query<FinancialReportFilter>,
    Query(export): Query<ExportQuery>,
) -> AppResult<Response> {
    let service = ReportingService::new(state.db.clone());
    let summary = service.financial_summary(&filter).await?;

    if export.is_csv() {
        report_response(vec![summary.totals], &export, "financial_summary")
    } else {
        Ok(Json(summary).into_response())
    }
}

pub async fn get_daily_financials(
    State(state): State<AppState>,
    Query(filter): Query<FinancialReportFilter>,
    Query(export): Query<ExportQuery>,
) -> AppResult<Response> {
    let service = ReportingService::new(state.db.clone());
    let rows = service.daily_financials(&filter).await?;
    report_response(rows, &export, "daily_financials")
}

pub async fn get_paid_order_financials(
    State(state): State<AppState>,
    Query(filter): Query<FinancialReportFilter>,
    Query(export): Query<ExportQuery>,
) -> AppResult<Response> {
    let service = ReportingService::new(state.db.clone());
    let rows = service.paid_order_financials(&filter).await?;
    report_response(rows, &export, "paid_orders")
}

pub async fn get_product_report(
    State(state): State<AppState>,
    Query(filter): Query<ProductReportFilter>,
    Query(export): Query<ExportQuery>,
) -> AppResult<Response> {
    let service = ReportingService::new(state.db.clone());
    let rows = service.product_report(&filter).await?;
    report_response(rows, &export, "products")
}

pub async fn get_order_report(
    State(state): State<AppState>,
    Query(filter): Query<OrderFilter>,
    Query(export): Query<ExportQuery>,
) -> AppResult<Response> {
    let service = OrderService::new(state.db.clone());
    let rows = service.all_admin(&filter).await?;
    report_response(rows, &export, "orders")
}

pub async fn get_stock_movement_report(
    State(state): State<AppState>,
    Query(filter): Query<MovementFilter>,
    Query(export): Query<ExportQuery>,
) -> AppResult<Response> {
    let service = InventoryService::new(state.db.clone());
    let rows = service.all_movements(&filter).await?;
    report_response(rows, &export, "stock_movements")
}

pub async fn get_feedback_report(
    State(state): State<AppState>,
    Query(filter): Query<FeedbackFilter>,
    Query(export): Query<ExportQuery>,
) -> AppResult<Response> {
    let service = FeedbackService::new(state.db.clone());
    let rows = service.all(&filter).await?;
    report_response(rows, &export, "feedback")
}
