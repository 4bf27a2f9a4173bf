use chrono::NaiveDate;
use kontera_core::{AccountId, CompanyId, FiscalYearId, Money};

use crate::DbPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccrualType {
    PrepaidExpense,
    AccruedExpense,
    PrepaidIncome,
    AccruedIncome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccrualFrequency {
    Monthly,
    Quarterly,
    Annual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccrualId(pub i64);

#[derive(Debug, Clone)]
pub struct Accrual {
    pub id: Option<AccrualId>,
    pub company_id: CompanyId,
    pub fiscal_year_id: FiscalYearId,
    pub name: String,
    pub description: Option<String>,
    pub accrual_type: AccrualType,
    pub total_amount: Money,
    pub periods: i64,
    pub amount_per_period: Money,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub frequency: AccrualFrequency,
    pub source_account_id: AccountId,
    pub target_account_id: AccountId,
    pub is_active: bool,
    pub auto_generate: bool,
}

pub fn accrual_type_to_str(t: AccrualType) -> &'static str {
    match t {
        AccrualType::PrepaidExpense => "PrepaidExpense",
        AccrualType::AccruedExpense => "AccruedExpense",
        AccrualType::PrepaidIncome => "PrepaidIncome",
        AccrualType::AccruedIncome => "AccruedIncome",
    }
}

pub fn accrual_type_from_str(s: &str) -> AccrualType {
    match s {
        "AccruedExpense" => AccrualType::AccruedExpense,
        "PrepaidIncome" => AccrualType::PrepaidIncome,
        "AccruedIncome" => AccrualType::AccruedIncome,
        _ => AccrualType::PrepaidExpense,
    }
}

pub fn frequency_to_str(f: AccrualFrequency) -> &'static str {
    match f {
        AccrualFrequency::Monthly => "Monthly",
        AccrualFrequency::Quarterly => "Quarterly",
        AccrualFrequency::Annual => "Annual",
    }
}

pub fn frequency_from_str(s: &str) -> AccrualFrequency {
    match s {
        "Quarterly" => AccrualFrequency::Quarterly,
        "Annual" => AccrualFrequency::Annual,
        _ => AccrualFrequency::Monthly,
    }
}

type AccrualRow = (
    i64,
    i64,
    i64,
    String,
    Option<String>,
    String,
    i64,
    i64,
    i64,
    String,
    String,
    String,
    i64,
    i64,
    i64,
    i64,
);

fn row_to_accrual(row: AccrualRow) -> Accrual {
    Accrual {
        id: Some(AccrualId(row.0)),
        company_id: CompanyId(row.1),
        fiscal_year_id: FiscalYearId(row.2),
        name: row.3,
        description: row.4,
        accrual_type: accrual_type_from_str(&row.5),
        total_amount: Money::from_ore(row.6),
        periods: row.7,
        amount_per_period: Money::from_ore(row.8),
        start_date: NaiveDate::parse_from_str(&row.9, "%Y-%m-%d").expect("valid date"),
        end_date: NaiveDate::parse_from_str(&row.10, "%Y-%m-%d").expect("valid date"),
        frequency: frequency_from_str(&row.11),
        source_account_id: AccountId(row.12),
        target_account_id: AccountId(row.13),
        is_active: row.14 != 0,
        auto_generate: row.15 != 0,
    }
}

pub async fn insert_accrual(pool: &DbPool, accrual: &Accrual) -> Result<AccrualId, sqlx::Error> {
    let id = sqlx::query(
        r#"
        INSERT INTO accruals (
            company_id, fiscal_year_id, name, description, accrual_type, total_amount_ore,
            periods, amount_per_period_ore, start_date, end_date, frequency, source_account_id,
            target_account_id, is_active, auto_generate
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(accrual.company_id.0)
    .bind(accrual.fiscal_year_id.0)
    .bind(&accrual.name)
    .bind(&accrual.description)
    .bind(accrual_type_to_str(accrual.accrual_type))
    .bind(accrual.total_amount.ore())
    .bind(accrual.periods)
    .bind(accrual.amount_per_period.ore())
    .bind(accrual.start_date.format("%Y-%m-%d").to_string())
    .bind(accrual.end_date.format("%Y-%m-%d").to_string())
    .bind(frequency_to_str(accrual.frequency))
    .bind(accrual.source_account_id.0)
    .bind(accrual.target_account_id.0)
    .bind(accrual.is_active as i64)
    .bind(accrual.auto_generate as i64)
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(AccrualId(id))
}

pub async fn get_accrual(pool: &DbPool, id: AccrualId) -> Result<Option<Accrual>, sqlx::Error> {
    let row = sqlx::query_as::<_, AccrualRow>(
        r#"
        SELECT id, company_id, fiscal_year_id, name, description, accrual_type, total_amount_ore,
               periods, amount_per_period_ore, start_date, end_date, frequency, source_account_id,
               target_account_id, is_active, auto_generate
        FROM accruals WHERE id = ?
        "#,
    )
    .bind(id.0)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(row_to_accrual))
}

pub async fn list_accruals(pool: &DbPool, company_id: CompanyId, active_only: bool) -> Result<Vec<Accrual>, sqlx::Error> {
    let query = if active_only {
        "SELECT id, company_id, fiscal_year_id, name, description, accrual_type, total_amount_ore, periods, amount_per_period_ore, start_date, end_date, frequency, source_account_id, target_account_id, is_active, auto_generate FROM accruals WHERE company_id = ? AND is_active = 1 ORDER BY start_date DESC"
    } else {
        "SELECT id, company_id, fiscal_year_id, name, description, accrual_type, total_amount_ore, periods, amount_per_period_ore, start_date, end_date, frequency, source_account_id, target_account_id, is_active, auto_generate FROM accruals WHERE company_id = ? ORDER BY start_date DESC"
    };

    let rows = sqlx::query_as::<_, AccrualRow>(query)
        .bind(company_id.0)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(row_to_accrual).collect())
}

pub async fn deactivate_accrual(pool: &DbPool, id: AccrualId) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE accruals SET is_active = 0 WHERE id = ?")
        .bind(id.0)
        .execute(pool)
        .await?;
    Ok(())
}

/// Idempotent by (accrual, period_number): `INSERT OR IGNORE`.
pub async fn insert_accrual_entry(
    pool: &DbPool,
    accrual_id: AccrualId,
    period_number: i64,
    period_date: NaiveDate,
    amount: Money,
    verification_id: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO accrual_entries (accrual_id, period_number, period_date, amount_ore, verification_id) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(accrual_id.0)
    .bind(period_number)
    .bind(period_date.format("%Y-%m-%d").to_string())
    .bind(amount.ore())
    .bind(verification_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn booked_period_numbers(pool: &DbPool, accrual_id: AccrualId) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT period_number FROM accrual_entries WHERE accrual_id = ? ORDER BY period_number")
        .bind(accrual_id.0)
        .fetch_all(pool)
        .await
}

pub async fn booked_amount_total(pool: &DbPool, accrual_id: AccrualId) -> Result<Money, sqlx::Error> {
    let total: Option<i64> =
        sqlx::query_scalar("SELECT SUM(amount_ore) FROM accrual_entries WHERE accrual_id = ?")
            .bind(accrual_id.0)
            .fetch_one(pool)
            .await?;
    Ok(Money::from_ore(total.unwrap_or(0)))
}
