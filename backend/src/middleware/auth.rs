//! Authentication middleware
//!
//! JWT authentication, staff gating and cart owner resolution

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use shared::CartOwner;

use crate::error::{AppError, ErrorDetail, ErrorResponse};
use crate::services::auth::{decode_access_token, Claims};
use crate::AppState;

/// Header carrying the anonymous cart key
pub const CART_SESSION_HEADER: &str = "x-cart-session";

/// Authenticated user information extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: uuid::Uuid,
    pub username: String,
    pub is_staff: bool,
}

impl TryFrom<Claims> for AuthUser {
    type Error = AppError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = uuid::Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidToken)?;
        Ok(Self {
            user_id,
            username: claims.username,
            is_staff: claims.is_staff,
        })
    }
}

/// Authentication middleware that requires a valid bearer token
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(request.headers()) {
        Some(token) => token,
        None => return unauthorized_response("Missing or invalid Authorization header"),
    };

    let auth_user = match authenticate(&state, &token) {
        Ok(user) => user,
        Err(err) => return err.into_response(),
    };

    request.extensions_mut().insert(auth_user);
    next.run(request).await
}

/// Authentication middleware for routes open to guests.
///
/// A missing header is fine; a present but invalid token is rejected so
/// clients notice an expired session instead of silently losing their cart.
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(request.headers()) {
        match authenticate(&state, &token) {
            Ok(user) => {
                request.extensions_mut().insert(user);
            }
            Err(err) => return err.into_response(),
        }
    }
    next.run(request).await
}

/// Back-office guard; must run after `auth_middleware`
pub async fn require_staff(request: Request, next: Next) -> Response {
    match request.extensions().get::<AuthUser>() {
        Some(user) if user.is_staff => next.run(request).await,
        Some(user) => {
            tracing::warn!(user_id = %user.user_id, "Non-staff user tried to reach the back office");
            AppError::InsufficientPermissions.into_response()
        }
        None => unauthorized_response("Authentication required"),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn authenticate(state: &AppState, token: &str) -> Result<AuthUser, AppError> {
    let claims = decode_access_token(token, &state.config.jwt.secret)?;
    AuthUser::try_from(claims)
}

/// Create unauthorized response
fn unauthorized_response(message: &str) -> Response {
    let error = ErrorResponse {
        error: ErrorDetail::new("UNAUTHORIZED", message, "Não autorizado"),
    };

    (StatusCode::UNAUTHORIZED, Json(error)).into_response()
}

/// Anonymous cart key sent by the client, if any
pub fn cart_session_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CART_SESSION_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|key| is_valid_session_key(key))
        .map(str::to_string)
}

/// Session keys are 8 to 64 characters of letters, digits and dashes
pub fn is_valid_session_key(key: &str) -> bool {
    (8..=64).contains(&key.len()) && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Extractor resolving whose cart a request operates on.
///
/// Signed-in users always use their own cart; guests must send a session key.
#[derive(Clone, Debug)]
pub struct CartIdentity(pub CartOwner);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CartIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(CartIdentity(CartOwner::User(user.user_id)));
        }
        cart_session_key(&parts.headers)
            .map(|key| CartIdentity(CartOwner::Session(key)))
            .ok_or_else(|| AppError::Validation {
                field: CART_SESSION_HEADER.to_string(),
                message: "Sign in or send a cart session key".to_string(),
                message_pt: "Faça login ou envie uma chave de sessão do carrinho".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_session_key_rules() {
        assert!(is_valid_session_key("3f2a9c1e-77aa"));
        assert!(!is_valid_session_key("short"));
        assert!(!is_valid_session_key("has spaces in it"));
        assert!(!is_valid_session_key(&"a".repeat(65)));
    }

    #[test]
    fn test_cart_session_key_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(cart_session_key(&headers), None);
        headers.insert(CART_SESSION_HEADER, HeaderValue::from_static(" guest-cart-0001 "));
        assert_eq!(cart_session_key(&headers), Some("guest-cart-0001".to_string()));
    }

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def".to_string()));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert_eq!(bearer_token(&headers), None);
    }
}
