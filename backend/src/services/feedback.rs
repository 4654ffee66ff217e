//! Customer ratings and comments

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{CreateFeedbackInput, Feedback, FeedbackRow, RatingSummary};
use shared::types::{PaginatedResponse, Pagination};

/// Feedback service
#[derive(Clone)]
pub struct FeedbackService {
    db: PgPool,
}

/// Visible feedback for a product page
#[derive(Debug, Clone, Serialize)]
pub struct ProductFeedback {
    pub summary: RatingSummary,
    pub entries: Vec<Feedback>,
}

/// Back-office feedback filters
#[derive(Debug, Default, Deserialize)]
pub struct FeedbackFilter {
    pub product_id: Option<Uuid>,
    /// Matches the author's username
    pub user: Option<String>,
    pub rating: Option<i16>,
    pub is_visible: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

const FEEDBACK_SELECT: &str = r#"
    SELECT f.id, f.user_id, u.username, f.product_id, p.name AS product_name,
           f.order_id, f.rating, f.comment, f.is_visible, f.created_at
    FROM feedback f
    LEFT JOIN users u ON u.id = f.user_id
    LEFT JOIN products p ON p.id = f.product_id
"#;

const FEEDBACK_FILTER_WHERE: &str = r#"
    WHERE ($1::UUID IS NULL OR f.product_id = $1)
      AND ($2::TEXT IS NULL OR u.username ILIKE $2)
      AND ($3::SMALLINT IS NULL OR f.rating = $3)
      AND ($4::BOOLEAN IS NULL OR f.is_visible = $4)
"#;

impl FeedbackService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record feedback from a customer. A referenced order must be theirs.
    pub async fn create(&self, user_id: Uuid, input: &CreateFeedbackInput) -> AppResult<Feedback> {
        if let Some(product_id) = input.product_id {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)",
            )
            .bind(product_id)
            .fetch_one(&self.db)
            .await?;
            if !exists {
                return Err(AppError::NotFound("Product".to_string()));
            }
        }

        if let Some(order_id) = input.order_id {
            let owner = sqlx::query_scalar::<_, Option<Uuid>>(
                "SELECT customer_id FROM orders WHERE id = $1",
            )
            .bind(order_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Order".to_string()))?;
            if owner != Some(user_id) {
                return Err(AppError::NotFound("Order".to_string()));
            }
        }

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO feedback (user_id, product_id, order_id, rating, comment)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(input.product_id)
        .bind(input.order_id)
        .bind(input.rating)
        .bind(input.comment.trim())
        .fetch_one(&self.db)
        .await?;

        tracing::info!(feedback_id = %id, rating = input.rating, "Feedback received");
        self.get(id).await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Feedback> {
        sqlx::query_as::<_, FeedbackRow>(&format!("{} WHERE f.id = $1", FEEDBACK_SELECT))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .map(Feedback::from)
            .ok_or_else(|| AppError::NotFound("Feedback".to_string()))
    }

    /// Visible feedback for a product, newest first, with its rating summary
    pub async fn for_product(&self, product_id: Uuid) -> AppResult<ProductFeedback> {
        let rows = sqlx::query_as::<_, FeedbackRow>(&format!(
            "{} WHERE f.product_id = $1 AND f.is_visible ORDER BY f.created_at DESC",
            FEEDBACK_SELECT
        ))
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        let entries: Vec<Feedback> = rows.into_iter().map(Feedback::from).collect();
        let ratings: Vec<i16> = entries.iter().map(|f| f.rating).collect();
        Ok(ProductFeedback {
            summary: RatingSummary::from_ratings(&ratings),
            entries,
        })
    }

    /// Back-office listing, newest first
    pub async fn list_admin(&self, filter: &FeedbackFilter) -> AppResult<PaginatedResponse<Feedback>> {
        let pagination = Pagination::new(filter.page, filter.per_page.unwrap_or(20).min(100));
        let user = user_pattern(filter);

        let total = sqlx::query_scalar::<_, i64>(&format!(
            r#"
            SELECT COUNT(*) FROM feedback f
            LEFT JOIN users u ON u.id = f.user_id
            {}
            "#,
            FEEDBACK_FILTER_WHERE
        ))
        .bind(filter.product_id)
        .bind(&user)
        .bind(filter.rating)
        .bind(filter.is_visible)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, FeedbackRow>(&format!(
            "{} {} ORDER BY f.created_at DESC LIMIT $5 OFFSET $6",
            FEEDBACK_SELECT, FEEDBACK_FILTER_WHERE
        ))
        .bind(filter.product_id)
        .bind(&user)
        .bind(filter.rating)
        .bind(filter.is_visible)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: rows.into_iter().map(Feedback::from).collect(),
            pagination: pagination.meta(total.max(0) as u64),
        })
    }

    /// Every entry matching the filter, for report export
    pub async fn all(&self, filter: &FeedbackFilter) -> AppResult<Vec<Feedback>> {
        let rows = sqlx::query_as::<_, FeedbackRow>(&format!(
            "{} {} ORDER BY f.created_at DESC",
            FEEDBACK_SELECT, FEEDBACK_FILTER_WHERE
        ))
        .bind(filter.product_id)
        .bind(user_pattern(filter))
        .bind(filter.rating)
        .bind(filter.is_visible)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Feedback::from).collect())
    }

    pub async fn set_visibility(&self, id: Uuid, is_visible: bool) -> AppResult<Feedback> {
        let result = sqlx::query("UPDATE feedback SET is_visible = $2 WHERE id = $1")
            .bind(id)
            .bind(is_visible)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Feedback".to_string()));
        }
        self.get(id).await
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM feedback WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Feedback".to_string()));
        }
        Ok(())
    }
}

fn user_pattern(filter: &FeedbackFilter) -> Option<String> {
    filter
        .user
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(|u| format!("%{}%", u))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_pattern() {
        let mut filter = FeedbackFilter::default();
        assert_eq!(user_pattern(&filter), None);
        filter.user = Some(" ana ".to_string());
        assert_eq!(user_pattern(&filter), Some("%ana%".to_string()));
    }
}
