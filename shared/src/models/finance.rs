//! Expenses, financial entries and profit aggregation

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::DateRange;

/// Expense classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseType {
    Fixed,
    Variable,
}

impl ExpenseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseType::Fixed => "fixed",
            ExpenseType::Variable => "variable",
        }
    }
}

impl std::str::FromStr for ExpenseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fixed" => Ok(ExpenseType::Fixed),
            "variable" => Ok(ExpenseType::Variable),
            other => Err(format!("unknown expense type '{}'", other)),
        }
    }
}

impl TryFrom<String> for ExpenseType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Manually recorded outgoing payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub category: String,
    pub expense_type: ExpenseType,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub supplier: Option<String>,
    pub installments: i32,
    pub created_at: DateTime<Utc>,
}

/// Direction of a financial ledger entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Income,
    Expense,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Income => "income",
            EntryType::Expense => "expense",
        }
    }
}

impl std::str::FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(EntryType::Income),
            "expense" => Ok(EntryType::Expense),
            other => Err(format!("unknown entry type '{}'", other)),
        }
    }
}

impl TryFrom<String> for EntryType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Manually recorded ledger line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialEntry {
    pub id: Uuid,
    pub entry_type: EntryType,
    pub category: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub installments: i32,
    pub created_at: DateTime<Utc>,
}

/// Dates of each installment, one calendar month apart.
///
/// Days past the end of a shorter month are clamped to its last day
/// (Jan 31 → Feb 28 → Mar 31 is computed from the base date each time).
/// A count of zero is treated as a single payment.
pub fn installment_dates(base: NaiveDate, count: u32) -> Vec<NaiveDate> {
    let count = count.max(1);
    (0..count)
        .filter_map(|i| base.checked_add_months(Months::new(i)))
        .collect()
}

// ============================================================================
// Aggregation
// ============================================================================

/// Revenue and cost of one paid order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFigures {
    pub date: NaiveDate,
    pub revenue: Decimal,
    pub cost: Decimal,
}

/// Amount of one expense
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseFigures {
    pub date: NaiveDate,
    pub expense_type: ExpenseType,
    pub amount: Decimal,
}

/// Headline indicators for a period
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialTotals {
    pub revenue: Decimal,
    pub cost: Decimal,
    pub fixed_expenses: Decimal,
    pub variable_expenses: Decimal,
    pub net_profit: Decimal,
}

pub fn summarize(orders: &[OrderFigures], expenses: &[ExpenseFigures]) -> FinancialTotals {
    let revenue: Decimal = orders.iter().map(|o| o.revenue).sum();
    let cost: Decimal = orders.iter().map(|o| o.cost).sum();
    let fixed_expenses = expense_total(expenses, ExpenseType::Fixed);
    let variable_expenses = expense_total(expenses, ExpenseType::Variable);

    FinancialTotals {
        revenue,
        cost,
        fixed_expenses,
        variable_expenses,
        net_profit: revenue - cost - fixed_expenses - variable_expenses,
    }
}

fn expense_total(expenses: &[ExpenseFigures], kind: ExpenseType) -> Decimal {
    expenses
        .iter()
        .filter(|e| e.expense_type == kind)
        .map(|e| e.amount)
        .sum()
}

/// One row of the daily financial report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyFinancialRow {
    pub date: NaiveDate,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub fixed: Decimal,
    pub variable: Decimal,
    pub profit: Decimal,
}

/// Sort key for the daily report; every key except `Date` sorts descending
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DailySort {
    #[default]
    Date,
    Revenue,
    Cost,
    Fixed,
    Variable,
    Profit,
}

impl std::str::FromStr for DailySort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date" => Ok(DailySort::Date),
            "revenue" => Ok(DailySort::Revenue),
            "cost" => Ok(DailySort::Cost),
            "fixed" => Ok(DailySort::Fixed),
            "variable" => Ok(DailySort::Variable),
            "profit" => Ok(DailySort::Profit),
            other => Err(format!("unknown sort key '{}'", other)),
        }
    }
}

/// Per-day figures, newest day first unless another sort key is given
pub fn daily_rows(
    orders: &[OrderFigures],
    expenses: &[ExpenseFigures],
    sort: DailySort,
) -> Vec<DailyFinancialRow> {
    let mut days: BTreeMap<NaiveDate, DailyFinancialRow> = BTreeMap::new();

    for o in orders {
        let row = day_row(&mut days, o.date);
        row.revenue += o.revenue;
        row.cost += o.cost;
    }
    for e in expenses {
        let row = day_row(&mut days, e.date);
        match e.expense_type {
            ExpenseType::Fixed => row.fixed += e.amount,
            ExpenseType::Variable => row.variable += e.amount,
        }
    }

    let mut rows: Vec<DailyFinancialRow> = days
        .into_values()
        .map(|mut r| {
            r.profit = r.revenue - r.cost - r.fixed - r.variable;
            r
        })
        .collect();

    match sort {
        DailySort::Date => rows.sort_by(|a, b| b.date.cmp(&a.date)),
        DailySort::Revenue => rows.sort_by(|a, b| b.revenue.cmp(&a.revenue)),
        DailySort::Cost => rows.sort_by(|a, b| b.cost.cmp(&a.cost)),
        DailySort::Fixed => rows.sort_by(|a, b| b.fixed.cmp(&a.fixed)),
        DailySort::Variable => rows.sort_by(|a, b| b.variable.cmp(&a.variable)),
        DailySort::Profit => rows.sort_by(|a, b| b.profit.cmp(&a.profit)),
    }
    rows
}

fn day_row(days: &mut BTreeMap<NaiveDate, DailyFinancialRow>, date: NaiveDate) -> &mut DailyFinancialRow {
    days.entry(date).or_insert_with(|| DailyFinancialRow {
        date,
        revenue: Decimal::ZERO,
        cost: Decimal::ZERO,
        fixed: Decimal::ZERO,
        variable: Decimal::ZERO,
        profit: Decimal::ZERO,
    })
}

/// Short month label, e.g. "Oct/26"
pub fn month_label(year: i32, month: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.format("%b/%y").to_string())
        .unwrap_or_default()
}

/// Monthly revenue against outflow (expenses plus cost of goods)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    pub label: String,
    pub revenue: Decimal,
    pub outflow: Decimal,
}

/// Months in chronological order, including any month with activity
pub fn monthly_series(orders: &[OrderFigures], expenses: &[ExpenseFigures]) -> Vec<MonthlyPoint> {
    let mut months: BTreeMap<(i32, u32), (Decimal, Decimal)> = BTreeMap::new();
    for o in orders {
        let entry = months.entry((o.date.year(), o.date.month())).or_default();
        entry.0 += o.revenue;
        entry.1 += o.cost;
    }
    for e in expenses {
        let entry = months.entry((e.date.year(), e.date.month())).or_default();
        entry.1 += e.amount;
    }
    months
        .into_iter()
        .map(|((y, m), (revenue, outflow))| MonthlyPoint {
            label: month_label(y, m),
            revenue,
            outflow,
        })
        .collect()
}

/// Profit chart data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitSeries {
    pub labels: Vec<String>,
    pub values: Vec<Decimal>,
}

/// Profit per day when `range` covers a single month, per month otherwise.
///
/// The daily series lists every day of the month ("01".."31"), zero-filled.
pub fn profit_series(
    range: &DateRange,
    orders: &[OrderFigures],
    expenses: &[ExpenseFigures],
) -> ProfitSeries {
    if range.is_single_month() {
        let month = DateRange::month_of(range.start);
        let mut per_day: BTreeMap<u32, Decimal> = BTreeMap::new();
        for o in orders.iter().filter(|o| month.contains(o.date)) {
            *per_day.entry(o.date.day()).or_default() += o.revenue - o.cost;
        }
        for e in expenses.iter().filter(|e| month.contains(e.date)) {
            *per_day.entry(e.date.day()).or_default() -= e.amount;
        }
        let days = month.end.day();
        ProfitSeries {
            labels: (1..=days).map(|d| format!("{:02}", d)).collect(),
            values: (1..=days)
                .map(|d| per_day.get(&d).copied().unwrap_or(Decimal::ZERO))
                .collect(),
        }
    } else {
        let mut per_month: BTreeMap<(i32, u32), Decimal> = BTreeMap::new();
        for o in orders {
            *per_month.entry((o.date.year(), o.date.month())).or_default() += o.revenue - o.cost;
        }
        for e in expenses {
            *per_month.entry((e.date.year(), e.date.month())).or_default() -= e.amount;
        }
        ProfitSeries {
            labels: per_month.keys().map(|(y, m)| month_label(*y, *m)).collect(),
            values: per_month.values().copied().collect(),
        }
    }
}

// ============================================================================
// Inputs
// ============================================================================

/// Input for creating an expense, optionally split into installments
#[derive(Debug, Clone, Serialize, Deserialize, validator::Validate)]
pub struct CreateExpenseInput {
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    pub expense_type: ExpenseType,
    pub amount: Decimal,
    pub date: NaiveDate,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(length(max = 200))]
    pub supplier: Option<String>,
    #[validate(range(min = 1, max = 120))]
    pub installments: Option<u32>,
}

/// Input for editing a single expense row
#[derive(Debug, Clone, Serialize, Deserialize, validator::Validate)]
pub struct UpdateExpenseInput {
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    pub expense_type: ExpenseType,
    pub amount: Decimal,
    pub date: NaiveDate,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(length(max = 200))]
    pub supplier: Option<String>,
}

/// Input for creating a financial entry, optionally split into installments
#[derive(Debug, Clone, Serialize, Deserialize, validator::Validate)]
pub struct CreateFinancialEntryInput {
    pub entry_type: EntryType,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 120))]
    pub installments: Option<u32>,
}
