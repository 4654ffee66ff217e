//! Catalog handlers for the storefront and the back office

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::models::{CreateProductInput, Product, UpdateProductInput};
use crate::services::feedback::ProductFeedback;
use crate::services::media::{remove_product_image, store_product_image};
use crate::services::product::{
    ProductFilter, ProductService, ProductSuggestion, StorefrontProduct,
};
use crate::services::FeedbackService;
use crate::AppState;
use shared::types::PaginatedResponse;

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Storefront catalog
pub async fn list_products(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> AppResult<Json<PaginatedResponse<StorefrontProduct>>> {
    let service = ProductService::new(state.db.clone());
    Ok(Json(service.list_storefront(&filter).await?))
}

/// Search-as-you-type suggestions
pub async fn search_products(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<ProductSuggestion>>> {
    let service = ProductService::new(state.db.clone());
    Ok(Json(service.search(&query.q).await?))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<StorefrontProduct>> {
    let service = ProductService::new(state.db.clone());
    Ok(Json(service.get_storefront(product_id).await?))
}

/// Visible ratings and comments for a product
pub async fn get_product_feedback(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ProductFeedback>> {
    let service = FeedbackService::new(state.db.clone());
    Ok(Json(service.for_product(product_id).await?))
}

// ============================================================================
// Back office
// ============================================================================

pub async fn admin_list_products(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> AppResult<Json<PaginatedResponse<Product>>> {
    let service = ProductService::new(state.db.clone());
    Ok(Json(service.list_admin(&filter).await?))
}

pub async fn admin_get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Product>> {
    let service = ProductService::new(state.db.clone());
    Ok(Json(service.get(product_id).await?))
}

pub async fn create_product(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<CreateProductInput>,
) -> AppResult<(StatusCode, Json<Product>)> {
    input.validate()?;
    let service = ProductService::new(state.db.clone());
    let product = service.create(&input, user.user_id).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(product_id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> AppResult<Json<Product>> {
    input.validate()?;
    let service = ProductService::new(state.db.clone());
    Ok(Json(service.update(product_id, &input, user.user_id).await?))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = ProductService::new(state.db.clone());
    if let Some(image) = service.delete(product_id).await? {
        remove_product_image(&state.config.storage.media_dir, &image).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Replace the product image with the `image` field of a multipart form
pub async fn upload_product_image(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    mut multipart: Multipart,
) -> AppResult<Json<Product>> {
    let max_bytes = state.config.storage.max_upload_bytes;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::ValidationError(format!("Invalid upload: {}", e)))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::ValidationError(format!("Invalid upload: {}", e)))?;

        if bytes.is_empty() {
            return Err(AppError::Validation {
                field: "image".to_string(),
                message: "The uploaded file is empty".to_string(),
                message_pt: "O arquivo enviado está vazio".to_string(),
            });
        }
        if bytes.len() > max_bytes {
            return Err(AppError::Validation {
                field: "image".to_string(),
                message: format!("Images are limited to {} bytes", max_bytes),
                message_pt: "A imagem excede o tamanho máximo".to_string(),
            });
        }

        let media_dir = &state.config.storage.media_dir;
        let stored = store_product_image(media_dir, &file_name, &bytes).await?;
        let service = ProductService::new(state.db.clone());
        let (product, previous) = match service.set_image(product_id, &stored).await {
            Ok(result) => result,
            Err(e) => {
                remove_product_image(media_dir, &stored).await;
                return Err(e);
            }
        };
        if let Some(previous) = previous {
            remove_product_image(media_dir, &previous).await;
        }
        return Ok(Json(product));
    }

    Err(AppError::Validation {
        field: "image".to_string(),
        message: "Missing image field".to_string(),
        message_pt: "Nenhuma imagem enviada".to_string(),
    })
}
