//! Checkout and order handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::config::MessagingConfig;
use crate::error::AppResult;
use crate::external::messaging::{
    click_to_chat_link, compose_order_message, OrderWebhookPayload,
};
use crate::external::CheckoutNotifier;
use crate::middleware::auth::AuthUser;
use crate::models::{CheckoutInput, Order};
use crate::services::order::{
    BulkStatusChangeInput, OrderDetail, OrderFilter, OrderSummary, StatusChangeInput,
    TransitionOutcome,
};
use crate::services::OrderService;
use crate::AppState;
use shared::types::{PaginatedResponse, Pagination};

/// Created order plus the pre-filled message the customer sends to the store
#[derive(Serialize)]
pub struct CheckoutResponse {
    pub order: OrderDetail,
    pub message: String,
    /// Missing only when the link cannot be built; the order is kept either way
    pub message_link: Option<String>,
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

pub async fn checkout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<CheckoutInput>,
) -> AppResult<(StatusCode, Json<CheckoutResponse>)> {
    input.validate()?;

    let service = OrderService::new(state.db.clone());
    let detail = service.checkout(user.user_id, &input).await?;

    let messaging = &state.config.messaging;
    let message = compose_order_message(&detail.order, &detail.items, &state.config.store.currency);
    let message_link = checkout_link(messaging, &detail.order.order_number, &message);

    if let Some(notifier) = CheckoutNotifier::from_config(messaging) {
        notifier.spawn_notify(OrderWebhookPayload::order_created(&detail.order, &detail.items));
    }

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            order: detail,
            message,
            message_link,
        }),
    ))
}

/// Click-to-chat link for a committed order. A failure is logged rather than
/// returned, since the order already exists and the cart is already empty.
fn checkout_link(messaging: &MessagingConfig, order_number: &str, message: &str) -> Option<String> {
    match click_to_chat_link(&messaging.link_base, &messaging.phone_number, message) {
        Ok(link) => Some(link),
        Err(err) => {
            tracing::error!(order_number, error = %err, "Failed to build checkout message link");
            None
        }
    }
}

/// The signed-in customer's orders
pub async fn list_my_orders(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<Order>>> {
    let service = OrderService::new(state.db.clone());
    let pagination = Pagination::new(query.page, query.per_page.unwrap_or(10).min(100));
    Ok(Json(service.list_for_customer(user.user_id, &pagination).await?))
}

pub async fn get_my_order(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<OrderDetail>> {
    let service = OrderService::new(state.db.clone());
    Ok(Json(service.get_for_customer(user.user_id, order_id).await?))
}

// ============================================================================
// Back office
// ============================================================================

pub async fn admin_list_orders(
    State(state): State<AppState>,
    Query(filter): Query<OrderFilter>,
) -> AppResult<Json<PaginatedResponse<OrderSummary>>> {
    let service = OrderService::new(state.db.clone());
    Ok(Json(service.list_admin(&filter).await?))
}

pub async fn admin_get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<OrderDetail>> {
    let service = OrderService::new(state.db.clone());
    Ok(Json(service.get(order_id).await?))
}

pub async fn change_order_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(order_id): Path<Uuid>,
    Json(input): Json<StatusChangeInput>,
) -> AppResult<Json<TransitionOutcome>> {
    let service = OrderService::new(state.db.clone());
    Ok(Json(service.change_status(order_id, &input, user.user_id).await?))
}

pub async fn bulk_change_order_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<BulkStatusChangeInput>,
) -> AppResult<Json<Vec<TransitionOutcome>>> {
    let service = OrderService::new(state.db.clone());
    Ok(Json(service.bulk_change_status(&input, user.user_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messaging(phone_number: &str) -> MessagingConfig {
        MessagingConfig {
            phone_number: phone_number.to_string(),
            link_base: "https://wa.me".to_string(),
            webhook_url: None,
            webhook_secret: None,
        }
    }

    #[test]
    fn test_checkout_link_built_for_configured_phone() {
        let link = checkout_link(&messaging("5511999999999"), "ORD-1", "Total: R$ 25.00");
        assert!(link.unwrap().starts_with("https://wa.me/5511999999999?text="));
    }

    #[test]
    fn test_checkout_link_failure_does_not_fail_checkout() {
        assert_eq!(checkout_link(&messaging(""), "ORD-1", "Total: R$ 25.00"), None);
    }
}
