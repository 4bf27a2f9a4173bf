use chrono::NaiveDate;
use kontera_core::{CompanyId, FiscalYear, FiscalYearId};

use crate::DbPool;

fn row_to_fiscal_year(row: (i64, i64, String, String, i64)) -> FiscalYear {
    let start = NaiveDate::parse_from_str(&row.2, "%Y-%m-%d").expect("stored date is valid");
    let end = NaiveDate::parse_from_str(&row.3, "%Y-%m-%d").expect("stored date is valid");
    let mut fy = FiscalYear::new(CompanyId(row.1), start, end);
    fy.id = Some(FiscalYearId(row.0));
    fy.is_closed = row.4 != 0;
    fy
}

pub async fn insert_fiscal_year(pool: &DbPool, fy: &FiscalYear) -> Result<FiscalYearId, sqlx::Error> {
    let id = sqlx::query(
        "INSERT INTO fiscal_years (company_id, start_date, end_date, is_closed) VALUES (?, ?, ?, ?)",
    )
    .bind(fy.company_id.0)
    .bind(fy.start_date().format("%Y-%m-%d").to_string())
    .bind(fy.end_date().format("%Y-%m-%d").to_string())
    .bind(fy.is_closed as i64)
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(FiscalYearId(id))
}

pub async fn get_fiscal_year(pool: &DbPool, id: FiscalYearId) -> Result<Option<FiscalYear>, sqlx::Error> {
    let row = sqlx::query_as::<_, (i64, i64, String, String, i64)>(
        "SELECT id, company_id, start_date, end_date, is_closed FROM fiscal_years WHERE id = ?",
    )
    .bind(id.0)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(row_to_fiscal_year))
}

pub async fn find_fiscal_year_by_range(
    pool: &DbPool,
    company_id: CompanyId,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Option<FiscalYear>, sqlx::Error> {
    let row = sqlx::query_as::<_, (i64, i64, String, String, i64)>(
        "SELECT id, company_id, start_date, end_date, is_closed FROM fiscal_years WHERE company_id = ? AND start_date = ? AND end_date = ?",
    )
    .bind(company_id.0)
    .bind(start.format("%Y-%m-%d").to_string())
    .bind(end.format("%Y-%m-%d").to_string())
    .fetch_optional(pool)
    .await?;

    Ok(row.map(row_to_fiscal_year))
}

pub async fn set_fiscal_year_closed(
    pool: &DbPool,
    id: FiscalYearId,
    closed: bool,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE fiscal_years SET is_closed = ? WHERE id = ?")
        .bind(closed as i64)
        .bind(id.0)
        .execute(pool)
        .await?;
    Ok(())
}
