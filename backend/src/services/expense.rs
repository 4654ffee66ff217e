//! Expense records

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    installment_dates, CreateExpenseInput, Expense, ExpenseRow, ExpenseType, UpdateExpenseInput,
};
use shared::types::{PaginatedResponse, Pagination};

const EXPENSES_PER_PAGE: u32 = 10;

const EXPENSE_COLUMNS: &str =
    "id, category, expense_type, amount, date, description, supplier, installments, created_at";

const EXPENSE_FILTER_WHERE: &str = r#"
    WHERE ($1::TEXT IS NULL OR category ILIKE $1 OR description ILIKE $1)
      AND ($2::TEXT IS NULL OR expense_type = $2)
      AND ($3::DATE IS NULL OR date >= $3)
      AND ($4::DATE IS NULL OR date <= $4)
      AND ($5::NUMERIC IS NULL OR amount >= $5)
      AND ($6::NUMERIC IS NULL OR amount <= $6)
"#;

/// Expense service
#[derive(Clone)]
pub struct ExpenseService {
    db: PgPool,
}

/// Expense listing filters
#[derive(Debug, Default, Deserialize)]
pub struct ExpenseFilter {
    /// Matches category or description
    pub q: Option<String>,
    pub expense_type: Option<ExpenseType>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    pub page: Option<u32>,
}

impl ExpenseFilter {
    fn text_pattern(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", q))
    }
}

impl ExpenseService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Expenses matching the filter, newest first, ten per page
    pub async fn list(&self, filter: &ExpenseFilter) -> AppResult<PaginatedResponse<Expense>> {
        let pagination = Pagination::new(filter.page, EXPENSES_PER_PAGE);
        let text = filter.text_pattern();
        let kind = filter.expense_type.map(|t| t.as_str());

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM expenses {}",
            EXPENSE_FILTER_WHERE
        ))
        .bind(&text)
        .bind(kind)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(filter.min_amount)
        .bind(filter.max_amount)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, ExpenseRow>(&format!(
            "SELECT {} FROM expenses {} ORDER BY date DESC, created_at DESC LIMIT $7 OFFSET $8",
            EXPENSE_COLUMNS, EXPENSE_FILTER_WHERE
        ))
        .bind(&text)
        .bind(kind)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(filter.min_amount)
        .bind(filter.max_amount)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: rows.into_iter().map(Expense::from).collect(),
            pagination: pagination.meta(total.max(0) as u64),
        })
    }

    /// Record an expense. With N installments, N rows are written one
    /// calendar month apart, each carrying the full amount.
    pub async fn create(&self, input: &CreateExpenseInput) -> AppResult<Vec<Expense>> {
        validate_amount(input.amount)?;

        let dates = installment_dates(input.date, input.installments.unwrap_or(1));
        let mut tx = self.db.begin().await?;
        let mut created = Vec::with_capacity(dates.len());

        for date in dates {
            let row = sqlx::query_as::<_, ExpenseRow>(&format!(
                r#"
                INSERT INTO expenses
                    (category, expense_type, amount, date, description, supplier, installments)
                VALUES ($1, $2, $3, $4, $5, $6, 1)
                RETURNING {}
                "#,
                EXPENSE_COLUMNS
            ))
            .bind(input.category.trim())
            .bind(input.expense_type.as_str())
            .bind(input.amount)
            .bind(date)
            .bind(&input.description)
            .bind(&input.supplier)
            .fetch_one(&mut *tx)
            .await?;
            created.push(Expense::from(row));
        }

        tx.commit().await?;
        tracing::info!(
            category = %input.category,
            rows = created.len(),
            "Expense recorded"
        );
        Ok(created)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Expense> {
        sqlx::query_as::<_, ExpenseRow>(&format!(
            "SELECT {} FROM expenses WHERE id = $1",
            EXPENSE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .map(Expense::from)
        .ok_or_else(|| AppError::NotFound("Expense".to_string()))
    }

    pub async fn update(&self, id: Uuid, input: &UpdateExpenseInput) -> AppResult<Expense> {
        validate_amount(input.amount)?;

        sqlx::query_as::<_, ExpenseRow>(&format!(
            r#"
            UPDATE expenses
            SET category = $2, expense_type = $3, amount = $4, date = $5,
                description = $6, supplier = $7
            WHERE id = $1
            RETURNING {}
            "#,
            EXPENSE_COLUMNS
        ))
        .bind(id)
        .bind(input.category.trim())
        .bind(input.expense_type.as_str())
        .bind(input.amount)
        .bind(input.date)
        .bind(&input.description)
        .bind(&input.supplier)
        .fetch_optional(&self.db)
        .await?
        .map(Expense::from)
        .ok_or_else(|| AppError::NotFound("Expense".to_string()))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Expense".to_string()));
        }
        Ok(())
    }
}

pub(crate) fn validate_amount(amount: Decimal) -> AppResult<()> {
    shared::validate_positive_amount(amount).map_err(|m| AppError::Validation {
        field: "amount".to_string(),
        message: m.to_string(),
        message_pt: "Valor inválido".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_must_be_positive() {
        assert!(validate_amount(Decimal::new(1999, 2)).is_ok());
        assert!(matches!(
            validate_amount(Decimal::ZERO),
            Err(AppError::Validation { .. })
        ));
    }

    #[test]
    fn test_text_pattern_ignores_blank() {
        let mut filter = ExpenseFilter {
            q: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.text_pattern(), None);
        filter.q = Some("rent".to_string());
        assert_eq!(filter.text_pattern(), Some("%rent%".to_string()));
    }
}
