//! Inventory handlers for the back office

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::models::{ManualMovementInput, MovementType, StockMovement};
use crate::services::inventory::{
    MovementFilter, StockLimitSaved, StockLimitUpdate, StockOverview, StockOverviewFilter,
};
use crate::services::InventoryService;
use crate::AppState;
use shared::types::{PaginatedResponse, Pagination};

#[derive(Deserialize)]
pub struct SaveLimitsRequest {
    pub limits: Vec<StockLimitUpdate>,
}

#[derive(Deserialize)]
pub struct MovementQuery {
    pub product_id: Option<Uuid>,
    pub product: Option<String>,
    pub movement_type: Option<MovementType>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl MovementQuery {
    pub fn filter(&self) -> MovementFilter {
        MovementFilter {
            product_id: self.product_id,
            product: self.product.clone(),
            movement_type: self.movement_type,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

/// Inventory dashboard cards and table
pub async fn get_stock_overview(
    State(state): State<AppState>,
    Query(filter): Query<StockOverviewFilter>,
) -> AppResult<Json<StockOverview>> {
    let service = InventoryService::new(state.db.clone());
    Ok(Json(service.get_overview(&filter).await?))
}

/// Save min/ideal thresholds edited in the dashboard table
pub async fn save_stock_limits(
    State(state): State<AppState>,
    Json(body): Json<SaveLimitsRequest>,
) -> AppResult<Json<Vec<StockLimitSaved>>> {
    let service = InventoryService::new(state.db.clone());
    Ok(Json(service.update_limits(&body.limits).await?))
}

pub async fn record_stock_movement(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(product_id): Path<Uuid>,
    Json(input): Json<ManualMovementInput>,
) -> AppResult<(StatusCode, Json<StockMovement>)> {
    input.validate()?;

    let service = InventoryService::new(state.db.clone());
    let movement = service
        .record_manual_movement(product_id, &input, user.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

pub async fn list_stock_movements(
    State(state): State<AppState>,
    Query(query): Query<MovementQuery>,
) -> AppResult<Json<PaginatedResponse<StockMovement>>> {
    let service = InventoryService::new(state.db.clone());
    let pagination = Pagination::new(query.page, query.per_page.unwrap_or(25).min(100));
    Ok(Json(service.list_movements(&query.filter(), &pagination).await?))
}
