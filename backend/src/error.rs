//! Error handling for the storefront server
//!
//! Provides consistent error responses in English and Portuguese

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::{CartError, MovementError, StatusChangeError, StockShortage};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String, message_pt: String },

    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_pt: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Insufficient stock for {} product(s)", .shortages.len())]
    InsufficientStock { shortages: Vec<StockShortage> },

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Product unavailable: {0}")]
    ProductUnavailable(String),

    // Storage errors
    #[error("Storage error: {0}")]
    StorageError(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_pt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorDetail {
    pub fn new(code: &str, message_en: impl Into<String>, message_pt: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message_en: message_en.into(),
            message_pt: message_pt.into(),
            field: None,
            details: None,
        }
    }

    fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new(
                    "INVALID_CREDENTIALS",
                    "Invalid username or password",
                    "Usuário ou senha inválidos",
                ),
            ),
            AppError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("TOKEN_EXPIRED", "Token has expired", "O token expirou"),
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("INVALID_TOKEN", "Invalid token", "Token inválido"),
            ),
            AppError::InsufficientPermissions => (
                StatusCode::FORBIDDEN,
                ErrorDetail::new(
                    "INSUFFICIENT_PERMISSIONS",
                    "You do not have permission to perform this action",
                    "Você não tem permissão para realizar esta ação",
                ),
            ),
            AppError::Unauthorized {
                message,
                message_pt,
            } => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("UNAUTHORIZED", message.clone(), message_pt.clone()),
            ),
            AppError::Validation {
                field,
                message,
                message_pt,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("VALIDATION_ERROR", message.clone(), message_pt.clone())
                    .with_field(field.clone()),
            ),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new(
                    "VALIDATION_ERROR",
                    msg.clone(),
                    format!("Dados inválidos: {}", msg),
                ),
            ),
            AppError::DuplicateEntry(field) => (
                StatusCode::CONFLICT,
                ErrorDetail::new(
                    "DUPLICATE_ENTRY",
                    format!("A record with this {} already exists", field),
                    format!("Já existe um registro com este {}", field),
                )
                .with_field(field.clone()),
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new(
                    "NOT_FOUND",
                    format!("{} not found", resource),
                    format!("{} não encontrado", resource),
                ),
            ),
            AppError::InsufficientStock { shortages } => {
                let mut detail = ErrorDetail::new(
                    "INSUFFICIENT_STOCK",
                    "Insufficient stock to mark the order as paid",
                    "Estoque insuficiente para marcar o pedido como pago",
                );
                detail.details = serde_json::to_value(shortages).ok();
                (StatusCode::CONFLICT, detail)
            }
            AppError::EmptyCart => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new("EMPTY_CART", "Your cart is empty", "Seu carrinho está vazio"),
            ),
            AppError::ProductUnavailable(name) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new(
                    "PRODUCT_UNAVAILABLE",
                    format!("{} is not available", name),
                    format!("{} não está disponível", name),
                ),
            ),
            AppError::StorageError(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail::new(
                    "STORAGE_ERROR",
                    format!("Storage error: {}", msg),
                    format!("Erro de armazenamento: {}", msg),
                ),
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "DATABASE_ERROR",
                    "A database error occurred",
                    "Ocorreu um erro no banco de dados",
                ),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", msg.clone(), "Erro interno do servidor"),
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "INTERNAL_ERROR",
                    "An internal server error occurred",
                    "Erro interno do servidor",
                ),
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let (field, message) = errors
            .field_errors()
            .into_iter()
            .next()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| format!("{} is invalid", field));
                (field.to_string(), message)
            })
            .unwrap_or_else(|| ("__all__".to_string(), errors.to_string()));

        AppError::Validation {
            message_pt: format!("Campo inválido: {}", field),
            field,
            message,
        }
    }
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::InvalidQuantity => AppError::Validation {
                field: "quantity".to_string(),
                message: err.to_string(),
                message_pt: "A quantidade deve ser pelo menos 1".to_string(),
            },
            CartError::QuantityTooLarge { max } => AppError::Validation {
                field: "quantity".to_string(),
                message: err.to_string(),
                message_pt: format!("A quantidade não pode passar de {} por produto", max),
            },
            CartError::ProductUnavailable => AppError::ProductUnavailable("Product".to_string()),
            CartError::Empty => AppError::EmptyCart,
        }
    }
}

impl From<StatusChangeError> for AppError {
    fn from(err: StatusChangeError) -> Self {
        let message = err.to_string();
        match err {
            StatusChangeError::InsufficientStock { shortages } => {
                AppError::InsufficientStock { shortages }
            }
            StatusChangeError::MissingStock(id) => {
                AppError::Internal(format!("stock snapshot missing product {}", id))
            }
            StatusChangeError::StockLimitExceeded { product_name, max } => AppError::Validation {
                field: "quantity".to_string(),
                message,
                message_pt: format!("O estoque de {} não pode passar de {} unidades", product_name, max),
            },
        }
    }
}

impl From<MovementError> for AppError {
    fn from(err: MovementError) -> Self {
        let message_pt = match &err {
            MovementError::NonPositiveQuantity => "A quantidade deve ser positiva".to_string(),
            MovementError::NegativeCount => "A contagem não pode ser negativa".to_string(),
            MovementError::Insufficient { available, .. } => {
                format!("Apenas {} unidades em estoque", available)
            }
            MovementError::NoChange => "O ajuste não altera a quantidade".to_string(),
            MovementError::StockLimitExceeded { max } => {
                format!("O estoque não pode passar de {} unidades", max)
            }
        };
        AppError::Validation {
            field: "quantity".to_string(),
            message: err.to_string(),
            message_pt,
        }
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
