//! Authentication handlers

use axum::{extract::State, http::HeaderMap, http::StatusCode, Extension, Json};
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::auth::{cart_session_key, AuthUser};
use crate::models::{LoginInput, RegisterInput, User};
use crate::services::auth::AuthSession;
use crate::services::{AuthService, CartService};
use crate::AppState;

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Register endpoint handler; a guest cart sent along is adopted
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RegisterInput>,
) -> AppResult<(StatusCode, Json<AuthSession>)> {
    body.validate()?;

    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let session = auth_service.register(body).await?;
    adopt_guest_cart(&state, &headers, &session).await;

    Ok((StatusCode::CREATED, Json(session)))
}

/// Login endpoint handler; a guest cart sent along is merged into the user's
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LoginInput>,
) -> AppResult<Json<AuthSession>> {
    body.validate()?;

    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let session = auth_service.login(&body.username, &body.password).await?;
    adopt_guest_cart(&state, &headers, &session).await;

    Ok(Json(session))
}

/// Refresh token endpoint handler
pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> AppResult<Json<AuthSession>> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let session = auth_service.refresh_token(&body.refresh_token).await?;
    Ok(Json(session))
}

/// Current account
pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<Json<User>> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    Ok(Json(auth_service.get_user(user.user_id).await?))
}

/// A failed merge must not fail the sign-in itself
async fn adopt_guest_cart(state: &AppState, headers: &HeaderMap, session: &AuthSession) {
    let Some(key) = cart_session_key(headers) else {
        return;
    };
    let carts = CartService::new(state.db.clone());
    if let Err(e) = carts.merge_session_cart(&key, session.user.id).await {
        tracing::warn!(user_id = %session.user.id, "Could not merge guest cart: {}", e);
    }
}
