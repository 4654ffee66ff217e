//! Shopping cart handlers for signed-in users and guests

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::auth::CartIdentity;
use crate::models::CartView;
use crate::services::cart::{AddCartItemInput, UpdateCartItemInput};
use crate::services::CartService;
use crate::AppState;

pub async fn get_cart(
    State(state): State<AppState>,
    CartIdentity(owner): CartIdentity,
) -> AppResult<Json<CartView>> {
    let service = CartService::new(state.db.clone());
    Ok(Json(service.view(&owner).await?))
}

pub async fn add_cart_item(
    State(state): State<AppState>,
    CartIdentity(owner): CartIdentity,
    Json(input): Json<AddCartItemInput>,
) -> AppResult<(StatusCode, Json<CartView>)> {
    input.validate()?;

    let service = CartService::new(state.db.clone());
    let cart = service.add_item(&owner, &input).await?;
    Ok((StatusCode::CREATED, Json(cart)))
}

pub async fn update_cart_item(
    State(state): State<AppState>,
    CartIdentity(owner): CartIdentity,
    Path(item_id): Path<Uuid>,
    Json(input): Json<UpdateCartItemInput>,
) -> AppResult<Json<CartView>> {
    input.validate()?;

    let service = CartService::new(state.db.clone());
    Ok(Json(service.update_item(&owner, item_id, input.quantity).await?))
}

pub async fn remove_cart_item(
    State(state): State<AppState>,
    CartIdentity(owner): CartIdentity,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<CartView>> {
    let service = CartService::new(state.db.clone());
    Ok(Json(service.remove_item(&owner, item_id).await?))
}

pub async fn clear_cart(
    State(state): State<AppState>,
    CartIdentity(owner): CartIdentity,
) -> AppResult<Json<CartView>> {
    let service = CartService::new(state.db.clone());
    Ok(Json(service.clear(&owner).await?))
}
