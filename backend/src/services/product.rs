//! Product catalog service for the storefront and the back office

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    availability_label, CreateProductInput, MovementType, PlannedMovement, Product, ProductRow,
    UpdateProductInput, PRODUCT_COLUMNS,
};
use crate::services::inventory::record_movement;
use shared::types::{PaginatedResponse, Pagination};

/// Product service
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

/// Product as shown to customers; the exact quantity is not exposed
#[derive(Debug, Clone, Serialize)]
pub struct StorefrontProduct {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image_path: Option<String>,
    pub availability: String,
}

impl From<Product> for StorefrontProduct {
    fn from(p: Product) -> Self {
        Self {
            availability: availability_label(p.quantity),
            id: p.id,
            name: p.name,
            description: p.description,
            price: p.price,
            image_path: p.image_path,
        }
    }
}

/// Search-as-you-type suggestion
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductSuggestion {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub image_path: Option<String>,
}

/// Catalog listing filters
#[derive(Debug, Default, Deserialize)]
pub struct ProductFilter {
    pub q: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ProductFilter {
    fn search_pattern(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", q))
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.per_page.unwrap_or(12).min(100))
    }
}

impl ProductService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Active products for the storefront, by name
    pub async fn list_storefront(
        &self,
        filter: &ProductFilter,
    ) -> AppResult<PaginatedResponse<StorefrontProduct>> {
        let page = self.list(filter, true).await?;
        Ok(PaginatedResponse {
            data: page.data.into_iter().map(StorefrontProduct::from).collect(),
            pagination: page.pagination,
        })
    }

    /// All products for the back office, by name
    pub async fn list_admin(&self, filter: &ProductFilter) -> AppResult<PaginatedResponse<Product>> {
        self.list(filter, false).await
    }

    async fn list(
        &self,
        filter: &ProductFilter,
        active_only: bool,
    ) -> AppResult<PaginatedResponse<Product>> {
        let pattern = filter.search_pattern();
        let pagination = filter.pagination();

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM products
            WHERE ($1::TEXT IS NULL OR name ILIKE $1)
              AND (NOT $2 OR is_active)
            "#,
        )
        .bind(&pattern)
        .bind(active_only)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            SELECT {} FROM products
            WHERE ($1::TEXT IS NULL OR name ILIKE $1)
              AND (NOT $2 OR is_active)
            ORDER BY name
            LIMIT $3 OFFSET $4
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(&pattern)
        .bind(active_only)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: rows.into_iter().map(Product::from).collect(),
            pagination: pagination.meta(total.max(0) as u64),
        })
    }

    /// Up to ten active products whose name contains `term`
    pub async fn search(&self, term: &str) -> AppResult<Vec<ProductSuggestion>> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let suggestions = sqlx::query_as::<_, ProductSuggestion>(
            r#"
            SELECT id, name, price, image_path
            FROM products
            WHERE is_active AND name ILIKE $1
            ORDER BY name
            LIMIT 10
            "#,
        )
        .bind(format!("%{}%", term))
        .fetch_all(&self.db)
        .await?;

        Ok(suggestions)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Product> {
        sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE id = $1",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .map(Product::from)
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    /// Storefront detail; inactive products are hidden
    pub async fn get_storefront(&self, id: Uuid) -> AppResult<StorefrontProduct> {
        let product = self.get(id).await?;
        if !product.is_active {
            return Err(AppError::NotFound("Product".to_string()));
        }
        Ok(product.into())
    }

    /// Create a product with its cost row; opening stock is logged as an entry
    pub async fn create(&self, input: &CreateProductInput, created_by: Uuid) -> AppResult<Product> {
        validate_price(input.price)?;
        validate_limits(input.min_stock, input.ideal_stock)?;

        let mut tx = self.db.begin().await?;

        let product: Product = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            INSERT INTO products (name, description, price, quantity, min_stock, ideal_stock)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.price)
        .bind(input.quantity)
        .bind(input.min_stock)
        .bind(input.ideal_stock)
        .fetch_one(&mut *tx)
        .await?
        .into();

        sqlx::query("INSERT INTO product_costs (product_id) VALUES ($1)")
            .bind(product.id)
            .execute(&mut *tx)
            .await?;

        if product.quantity > 0 {
            let opening = PlannedMovement {
                product_id: product.id,
                movement_type: MovementType::Entry,
                quantity_change: product.quantity,
                resulting_balance: product.quantity,
                note: "Initial stock".to_string(),
            };
            record_movement(&mut *tx, &opening, &product.name, None, Some(created_by)).await?;
        }

        tx.commit().await?;
        tracing::info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Update a product; a quantity change is logged as an adjustment
    pub async fn update(
        &self,
        id: Uuid,
        input: &UpdateProductInput,
        updated_by: Uuid,
    ) -> AppResult<Product> {
        let mut tx = self.db.begin().await?;

        let current: Product = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE id = $1 FOR UPDATE",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?
        .into();

        let price = input.price.unwrap_or(current.price);
        let min_stock = input.min_stock.unwrap_or(current.min_stock);
        let ideal_stock = input.ideal_stock.unwrap_or(current.ideal_stock);
        let quantity = input.quantity.unwrap_or(current.quantity);
        validate_price(price)?;
        validate_limits(min_stock, ideal_stock)?;

        let updated: Product = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            UPDATE products
            SET name = $2, description = $3, price = $4, quantity = $5,
                min_stock = $6, ideal_stock = $7, deactivated = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .bind(input.name.as_deref().map(str::trim).unwrap_or(current.name.as_str()))
        .bind(input.description.as_deref().unwrap_or(current.description.as_str()))
        .bind(price)
        .bind(quantity)
        .bind(min_stock)
        .bind(ideal_stock)
        .bind(input.deactivated.unwrap_or(current.deactivated))
        .fetch_one(&mut *tx)
        .await?
        .into();

        if quantity != current.quantity {
            let adjustment = PlannedMovement {
                product_id: id,
                movement_type: MovementType::Adjustment,
                quantity_change: quantity - current.quantity,
                resulting_balance: quantity,
                note: format!("Edited from {} to {}", current.quantity, quantity),
            };
            record_movement(&mut *tx, &adjustment, &updated.name, None, Some(updated_by)).await?;
        }

        tx.commit().await?;
        Ok(updated)
    }

    /// Point the product at a newly stored image, returning the old path
    pub async fn set_image(&self, id: Uuid, image_path: &str) -> AppResult<(Product, Option<String>)> {
        let previous = sqlx::query_scalar::<_, Option<String>>(
            "SELECT image_path FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let product = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE products SET image_path = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .bind(image_path)
        .fetch_one(&self.db)
        .await?;

        Ok((product.into(), previous))
    }

    /// Delete a product. Order lines and ledger rows keep their snapshots.
    pub async fn delete(&self, id: Uuid) -> AppResult<Option<String>> {
        let image_path = sqlx::query_scalar::<_, Option<String>>(
            "DELETE FROM products WHERE id = $1 RETURNING image_path",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        tracing::info!(product_id = %id, "Product deleted");
        Ok(image_path)
    }
}

fn validate_price(price: Decimal) -> AppResult<()> {
    shared::validate_money(price).map_err(|m| AppError::Validation {
        field: "price".to_string(),
        message: m.to_string(),
        message_pt: "Preço inválido".to_string(),
    })
}

fn validate_limits(min_stock: i32, ideal_stock: i32) -> AppResult<()> {
    shared::validate_stock_limits(min_stock, ideal_stock).map_err(|m| AppError::Validation {
        field: "min_stock".to_string(),
        message: m.to_string(),
        message_pt: "O estoque mínimo não pode ser maior que o ideal".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_storefront_product_hides_quantity() {
        let product = Product {
            id: Uuid::new_v4(),
            name: "Brownie".to_string(),
            description: String::new(),
            price: Decimal::new(850, 2),
            quantity: 120,
            image_path: None,
            min_stock: 5,
            ideal_stock: 50,
            is_active: true,
            deactivated: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let view = StorefrontProduct::from(product);
        assert_eq!(view.availability, "+100 available");
    }

    #[test]
    fn test_filter_pagination_is_capped() {
        let filter = ProductFilter {
            q: Some("  ".to_string()),
            page: Some(3),
            per_page: Some(1000),
        };
        assert_eq!(filter.search_pattern(), None);
        let page = filter.pagination();
        assert_eq!(page.per_page, 100);
        assert_eq!(page.page, 3);
    }

    #[test]
    fn test_limits_validation() {
        assert!(validate_limits(2, 10).is_ok());
        assert!(matches!(
            validate_limits(11, 10),
            Err(AppError::Validation { .. })
        ));
    }
}
