//! Feedback handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::models::{CreateFeedbackInput, Feedback, FeedbackVisibilityInput};
use crate::services::feedback::FeedbackFilter;
use crate::services::FeedbackService;
use crate::AppState;
use shared::types::PaginatedResponse;

pub async fn create_feedback(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<CreateFeedbackInput>,
) -> AppResult<(StatusCode, Json<Feedback>)> {
    input.validate()?;
    let service = FeedbackService::new(state.db.clone());
    let feedback = service.create(user.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(feedback)))
}

pub async fn admin_list_feedback(
    State(state): State<AppState>,
    Query(filter): Query<FeedbackFilter>,
) -> AppResult<Json<PaginatedResponse<Feedback>>> {
    let service = FeedbackService::new(state.db.clone());
    Ok(Json(service.list_admin(&filter).await?))
}

/// Hide or show an entry on the storefront
pub async fn set_feedback_visibility(
    State(state): State<AppState>,
    Path(feedback_id): Path<Uuid>,
    Json(input): Json<FeedbackVisibilityInput>,
) -> AppResult<Json<Feedback>> {
    let service = FeedbackService::new(state.db.clone());
    Ok(Json(service.set_visibility(feedback_id, input.is_visible).await?))
}

pub async fn delete_feedback(
    State(state): State<AppState>,
    Path(feedback_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = FeedbackService::new(state.db.clone());
    service.delete(feedback_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
