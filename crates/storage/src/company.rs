use kontera_core::{AccountingStandard, Company, CompanyId};

use crate::DbPool;

fn standard_to_str(standard: AccountingStandard) -> &'static str {
    match standard {
        AccountingStandard::K2 => "K2",
        AccountingStandard::K3 => "K3",
    }
}

fn standard_from_str(s: &str) -> AccountingStandard {
    match s {
        "K3" => AccountingStandard::K3,
        _ => AccountingStandard::K2,
    }
}

fn row_to_company(row: (i64, String, String, String, i64, Option<String>)) -> Company {
    Company {
        id: Some(CompanyId(row.0)),
        name: row.1,
        org_number: row.2,
        accounting_standard: standard_from_str(&row.3),
        fiscal_year_start_month: row.4 as u8,
        contact_email: row.5,
    }
}

pub async fn insert_company(pool: &DbPool, company: &Company) -> Result<CompanyId, sqlx::Error> {
    let id = sqlx::query(
        "INSERT INTO companies (name, org_number, accounting_standard, fiscal_year_start_month, contact_email) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&company.name)
    .bind(&company.org_number)
    .bind(standard_to_str(company.accounting_standard))
    .bind(company.fiscal_year_start_month as i64)
    .bind(&company.contact_email)
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(CompanyId(id))
}

pub async fn get_company(pool: &DbPool, id: CompanyId) -> Result<Option<Company>, sqlx::Error> {
    let row = sqlx::query_as::<_, (i64, String, String, String, i64, Option<String>)>(
        "SELECT id, name, org_number, accounting_standard, fiscal_year_start_month, contact_email FROM companies WHERE id = ?",
    )
    .bind(id.0)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(row_to_company))
}

pub async fn find_company_by_org_number(
    pool: &DbPool,
    org_number: &str,
) -> Result<Option<Company>, sqlx::Error> {
    let row = sqlx::query_as::<_, (i64, String, String, String, i64, Option<String>)>(
        "SELECT id, name, org_number, accounting_standard, fiscal_year_start_month, contact_email FROM companies WHERE org_number = ?",
    )
    .bind(org_number)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(row_to_company))
}
