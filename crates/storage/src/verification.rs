use chrono::{DateTime, NaiveDate, Utc};
use kontera_core::{
    AccountId, CompanyId, FiscalYearId, Money, Verification, VerificationId, VerificationLine,
};

use crate::DbPool;

pub async fn next_verification_number(
    pool: &DbPool,
    company_id: CompanyId,
    fiscal_year_id: FiscalYearId,
) -> Result<i64, sqlx::Error> {
    let max: Option<i64> = sqlx::query_scalar(
        "SELECT MAX(number) FROM verifications WHERE company_id = ? AND fiscal_year_id = ?",
    )
    .bind(company_id.0)
    .bind(fiscal_year_id.0)
    .fetch_one(pool)
    .await?;

    Ok(max.unwrap_or(0) + 1)
}

/// Inserts a verification header and its lines as a single atomic commit.
/// Callers (the posting engine) are responsible for validating balance and
/// period/account constraints before calling this — storage performs no
/// domain validation of its own.
pub async fn insert_verification(
    pool: &DbPool,
    company_id: CompanyId,
    fiscal_year_id: FiscalYearId,
    number: i64,
    transaction_date: NaiveDate,
    description: &str,
    lines: &[VerificationLine],
) -> Result<VerificationId, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let verification_id = sqlx::query(
        "INSERT INTO verifications (company_id, fiscal_year_id, number, transaction_date, description) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(company_id.0)
    .bind(fiscal_year_id.0)
    .bind(number)
    .bind(transaction_date.format("%Y-%m-%d").to_string())
    .bind(description)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    for (order, line) in lines.iter().enumerate() {
        sqlx::query(
            "INSERT INTO verification_lines (verification_id, account_id, debit_ore, credit_ore, note, line_order) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(verification_id)
        .bind(line.account_id.0)
        .bind(line.debit.ore())
        .bind(line.credit.ore())
        .bind(&line.note)
        .bind(order as i64)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(VerificationId(verification_id))
}

async fn fetch_lines(
    pool: &DbPool,
    verification_id: VerificationId,
) -> Result<Vec<VerificationLine>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (i64, i64, i64, Option<String>)>(
        "SELECT account_id, debit_ore, credit_ore, note FROM verification_lines WHERE verification_id = ? ORDER BY line_order",
    )
    .bind(verification_id.0)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(account_id, debit, credit, note)| VerificationLine {
            account_id: AccountId(account_id),
            debit: Money::from_ore(debit),
            credit: Money::from_ore(credit),
            note,
        })
        .collect())
}

pub async fn get_verification(
    pool: &DbPool,
    id: VerificationId,
) -> Result<Option<Verification>, sqlx::Error> {
    let header = sqlx::query_as::<_, (i64, i64, i64, i64, String, String, String)>(
        "SELECT id, company_id, fiscal_year_id, number, transaction_date, description, created_at FROM verifications WHERE id = ?",
    )
    .bind(id.0)
    .fetch_optional(pool)
    .await?;

    let Some((id, company_id, fiscal_year_id, number, date, description, created_at)) = header
    else {
        return Ok(None);
    };

    let lines = fetch_lines(pool, VerificationId(id)).await?;

    Ok(Some(Verification {
        id: Some(VerificationId(id)),
        company_id: CompanyId(company_id),
        fiscal_year_id: FiscalYearId(fiscal_year_id),
        number,
        transaction_date: NaiveDate::parse_from_str(&date, "%Y-%m-%d").expect("stored date is valid"),
        description,
        lines,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                chrono::NaiveDateTime::parse_from_str(&created_at, "%Y-%m-%d %H:%M:%S")
                    .ok()
                    .map(|naive| naive.and_utc())
            }),
    }))
}

pub async fn list_verifications(
    pool: &DbPool,
    company_id: CompanyId,
    fiscal_year_id: FiscalYearId,
) -> Result<Vec<Verification>, sqlx::Error> {
    let ids: Vec<i64> = sqlx::query_scalar(
        "SELECT id FROM verifications WHERE company_id = ? AND fiscal_year_id = ? ORDER BY number",
    )
    .bind(company_id.0)
    .bind(fiscal_year_id.0)
    .fetch_all(pool)
    .await?;

    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(v) = get_verification(pool, VerificationId(id)).await? {
            out.push(v);
        }
    }
    Ok(out)
}

pub async fn delete_verification(pool: &DbPool, id: VerificationId) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM verifications WHERE id = ?")
        .bind(id.0)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn update_verification_header(
    pool: &DbPool,
    id: VerificationId,
    transaction_date: NaiveDate,
    description: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE verifications SET transaction_date = ?, description = ? WHERE id = ?")
        .bind(transaction_date.format("%Y-%m-%d").to_string())
        .bind(description)
        .bind(id.0)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn add_line(
    pool: &DbPool,
    verification_id: VerificationId,
    line: &VerificationLine,
) -> Result<(), sqlx::Error> {
    let next_order: i64 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(line_order), -1) + 1 FROM verification_lines WHERE verification_id = ?",
    )
    .bind(verification_id.0)
    .fetch_one(pool)
    .await?;

    sqlx::query(
        "INSERT INTO verification_lines (verification_id, account_id, debit_ore, credit_ore, note, line_order) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(verification_id.0)
    .bind(line.account_id.0)
    .bind(line.debit.ore())
    .bind(line.credit.ore())
    .bind(&line.note)
    .bind(next_order)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_line(pool: &DbPool, verification_id: VerificationId, line_order: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM verification_lines WHERE verification_id = ? AND line_order = ?")
        .bind(verification_id.0)
        .bind(line_order)
        .execute(pool)
        .await?;
    Ok(())
}

/// Movement sums (debit, credit) posted during `start..=end` to every
/// account of `company_id` whose number starts with `prefix` (an empty
/// prefix matches every account). Used by the report aggregators, which
/// reason about whole BAS account groups rather than single accounts.
pub async fn period_sums_for_prefix(
    pool: &DbPool,
    company_id: CompanyId,
    prefix: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<(Money, Money), sqlx::Error> {
    let row: (Option<i64>, Option<i64>) = sqlx::query_as(
        r#"
        SELECT SUM(vl.debit_ore), SUM(vl.credit_ore)
        FROM verification_lines vl
        JOIN verifications v ON v.id = vl.verification_id
        JOIN accounts a ON a.id = vl.account_id
        WHERE v.company_id = ?
          AND a.number LIKE ? || '%'
          AND v.transaction_date >= ?
          AND v.transaction_date <= ?
        "#,
    )
    .bind(company_id.0)
    .bind(prefix)
    .bind(start.format("%Y-%m-%d").to_string())
    .bind(end.format("%Y-%m-%d").to_string())
    .fetch_one(pool)
    .await?;

    Ok((Money::from_ore(row.0.unwrap_or(0)), Money::from_ore(row.1.unwrap_or(0))))
}

/// Movement sums (debit, credit) posted to `account_id` on or before
/// `cutoff`, across every verification regardless of fiscal year. The
/// balance engine adds the account's opening balance on top of this.
pub async fn line_sums_for_account(
    pool: &DbPool,
    account_id: AccountId,
    cutoff: NaiveDate,
) -> Result<(Money, Money), sqlx::Error> {
    let row: (Option<i64>, Option<i64>) = sqlx::query_as(
        r#"
        SELECT SUM(vl.debit_ore), SUM(vl.credit_ore)
        FROM verification_lines vl
        JOIN verifications v ON v.id = vl.verification_id
        WHERE vl.account_id = ? AND v.transaction_date <= ?
        "#,
    )
    .bind(account_id.0)
    .bind(cutoff.format("%Y-%m-%d").to_string())
    .fetch_one(pool)
    .await?;

    Ok((Money::from_ore(row.0.unwrap_or(0)), Money::from_ore(row.1.unwrap_or(0))))
}
