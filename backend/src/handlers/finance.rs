//! Back-office finance handlers: product costs, expenses and financial entries

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::models::{
    CreateExpenseInput, CreateFinancialEntryInput, Expense, FinancialEntry, UpdateExpenseInput,
};
use crate::services::cost::{
    CostHistoryFilter, CostHistoryPage, CostUpdate, CostUpdateSummary, ProductCost,
};
use crate::services::expense::ExpenseFilter;
use crate::services::financial_entry::FinancialEntryFilter;
use crate::services::{CostService, ExpenseService, FinancialEntryService};
use crate::AppState;
use shared::types::PaginatedResponse;

#[derive(Deserialize)]
pub struct UpdateCostsRequest {
    pub costs: Vec<CostUpdate>,
}

// ============================================================================
// Product costs
// ============================================================================

pub async fn list_product_costs(State(state): State<AppState>) -> AppResult<Json<Vec<ProductCost>>> {
    let service = CostService::new(state.db.clone());
    Ok(Json(service.list().await?))
}

pub async fn update_product_costs(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpdateCostsRequest>,
) -> AppResult<Json<CostUpdateSummary>> {
    let service = CostService::new(state.db.clone());
    Ok(Json(service.update_costs(&body.costs, user.user_id).await?))
}

pub async fn list_cost_history(
    State(state): State<AppState>,
    Query(filter): Query<CostHistoryFilter>,
) -> AppResult<Json<CostHistoryPage>> {
    let service = CostService::new(state.db.clone());
    Ok(Json(service.history(&filter).await?))
}

// ============================================================================
// Expenses
// ============================================================================

pub async fn list_expenses(
    State(state): State<AppState>,
    Query(filter): Query<ExpenseFilter>,
) -> AppResult<Json<PaginatedResponse<Expense>>> {
    let service = ExpenseService::new(state.db.clone());
    Ok(Json(service.list(&filter).await?))
}

/// Create an expense; returns one row per installment
pub async fn create_expense(
    State(state): State<AppState>,
    Json(input): Json<CreateExpenseInput>,
) -> AppResult<(StatusCode, Json<Vec<Expense>>)> {
    input.validate()?;
    let service = ExpenseService::new(state.db.clone());
    let created = service.create(&input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_expense(
    State(state): State<AppState>,
    Path(expense_id): Path<Uuid>,
) -> AppResult<Json<Expense>> {
    let service = ExpenseService::new(state.db.clone());
    Ok(Json(service.get(expense_id).await?))
}

pub async fn update_expense(
    State(state): State<AppState>,
    Path(expense_id): Path<Uuid>,
    Json(input): Json<UpdateExpenseInput>,
) -> AppResult<Json<Expense>> {
    input.validate()?;
    let service = ExpenseService::new(state.db.clone());
    Ok(Json(service.update(expense_id, &input).await?))
}

pub async fn delete_expense(
    State(state): State<AppState>,
    Path(expense_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = ExpenseService::new(state.db.clone());
    service.delete(expense_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Financial entries
// ============================================================================

pub async fn list_financial_entries(
    State(state): State<AppState>,
    Query(filter): Query<FinancialEntryFilter>,
) -> AppResult<Json<Vec<FinancialEntry>>> {
    let service = FinancialEntryService::new(state.db.clone());
    Ok(Json(service.list(&filter).await?))
}

pub async fn create_financial_entry(
    State(state): State<AppState>,
    Json(input): Json<CreateFinancialEntryInput>,
) -> AppResult<(StatusCode, Json<Vec<FinancialEntry>>)> {
    input.validate()?;
    let service = FinancialEntryService::new(state.db.clone());
    let created = service.create(&input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn delete_financial_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = FinancialEntryService::new(state.db.clone());
    service.delete(entry_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
