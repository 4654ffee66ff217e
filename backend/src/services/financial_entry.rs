//! Manual income and expense ledger lines

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    installment_dates, CreateFinancialEntryInput, EntryType, FinancialEntry, FinancialEntryRow,
};
use crate::services::expense::validate_amount;

const ENTRY_COLUMNS: &str =
    "id, entry_type, category, amount, date, description, installments, created_at";

/// Financial entry service
#[derive(Clone)]
pub struct FinancialEntryService {
    db: PgPool,
}

#[derive(Debug, Default, Deserialize)]
pub struct FinancialEntryFilter {
    pub entry_type: Option<EntryType>,
    pub category: Option<String>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl FinancialEntryService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record an entry, one row per installment
    pub async fn create(&self, input: &CreateFinancialEntryInput) -> AppResult<Vec<FinancialEntry>> {
        validate_amount(input.amount)?;

        let dates = installment_dates(input.date, input.installments.unwrap_or(1));
        let mut tx = self.db.begin().await?;
        let mut created = Vec::with_capacity(dates.len());

        for date in dates {
            let row = sqlx::query_as::<_, FinancialEntryRow>(&format!(
                r#"
                INSERT INTO financial_entries
                    (entry_type, category, amount, date, description, installments)
                VALUES ($1, $2, $3, $4, $5, 1)
                RETURNING {}
                "#,
                ENTRY_COLUMNS
            ))
            .bind(input.entry_type.as_str())
            .bind(input.category.trim())
            .bind(input.amount)
            .bind(date)
            .bind(&input.description)
            .fetch_one(&mut *tx)
            .await?;
            created.push(FinancialEntry::from(row));
        }

        tx.commit().await?;
        Ok(created)
    }

    /// Entries matching the filter, newest first
    pub async fn list(&self, filter: &FinancialEntryFilter) -> AppResult<Vec<FinancialEntry>> {
        let category = filter
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(|c| format!("%{}%", c));

        let rows = sqlx::query_as::<_, FinancialEntryRow>(&format!(
            r#"
            SELECT {} FROM financial_entries
            WHERE ($1::TEXT IS NULL OR entry_type = $1)
              AND ($2::TEXT IS NULL OR category ILIKE $2)
              AND ($3::NUMERIC IS NULL OR amount >= $3)
              AND ($4::NUMERIC IS NULL OR amount <= $4)
              AND ($5::DATE IS NULL OR date >= $5)
              AND ($6::DATE IS NULL OR date <= $6)
            ORDER BY date DESC, created_at DESC
            "#,
            ENTRY_COLUMNS
        ))
        .bind(filter.entry_type.map(|t| t.as_str()))
        .bind(category)
        .bind(filter.min_amount)
        .bind(filter.max_amount)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(FinancialEntry::from).collect())
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM financial_entries WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Financial entry".to_string()));
        }
        Ok(())
    }
}
