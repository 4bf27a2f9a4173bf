use chrono::{Months, NaiveDate};
use kontera_core::{CompanyId, FiscalYearId, Money, VerificationLine};
use kontera_ledger::PostingEngine;
use kontera_storage::{Accrual, AccrualFrequency, AccrualId, AccrualType, DbPool};

use crate::error::RuleError;

/// Suggested balance-sheet account for the deferred amount, by accrual type.
/// Mirrors [`crate::depreciation::default_accounts`]: a starting point for
/// new accruals, not something later code relies on.
pub fn default_source_account(accrual_type: AccrualType) -> &'static str {
    match accrual_type {
        AccrualType::PrepaidExpense => "1710",
        AccrualType::AccruedExpense => "2990",
        AccrualType::PrepaidIncome => "2990",
        AccrualType::AccruedIncome => "1790",
    }
}

fn months_per_period(frequency: AccrualFrequency) -> u32 {
    match frequency {
        AccrualFrequency::Monthly => 1,
        AccrualFrequency::Quarterly => 3,
        AccrualFrequency::Annual => 12,
    }
}

/// The calendar date of the nth period (1-indexed) in an accrual's schedule.
pub fn period_date(accrual: &Accrual, period_number: i64) -> NaiveDate {
    let months = months_per_period(accrual.frequency) * (period_number as u32);
    accrual
        .start_date
        .checked_add_months(Months::new(months))
        .unwrap_or(accrual.end_date)
}

/// The amount for one period of an accrual's schedule. Every period but the
/// last gets `amount_per_period`; the last period absorbs whatever residual
/// is left over so the sum of all periods equals `total_amount` exactly,
/// matching [`kontera_core::Money::split_periods`]'s rounding discipline.
pub fn generate_entry(accrual: &Accrual, period_number: i64) -> Money {
    if period_number >= accrual.periods {
        let prior_periods = (accrual.periods - 1).max(0);
        let booked_so_far = Money::from_ore(accrual.amount_per_period.ore() * prior_periods);
        return accrual.total_amount - booked_so_far;
    }
    accrual.amount_per_period
}

fn posting_lines(accrual: &Accrual, amount: Money) -> Vec<VerificationLine> {
    match accrual.accrual_type {
        AccrualType::PrepaidExpense | AccrualType::AccruedExpense => vec![
            VerificationLine::debit(accrual.target_account_id, amount),
            VerificationLine::credit(accrual.source_account_id, amount),
        ],
        AccrualType::PrepaidIncome | AccrualType::AccruedIncome => vec![
            VerificationLine::debit(accrual.source_account_id, amount),
            VerificationLine::credit(accrual.target_account_id, amount),
        ],
    }
}

/// One not-yet-booked period: what would be posted if generated now.
pub struct PendingEntry {
    pub period_number: i64,
    pub period_date: NaiveDate,
    pub amount: Money,
}

/// Previews the periods of an accrual that fall on or before `as_of` and
/// have not yet been booked, without creating anything.
pub async fn get_pending_entries(
    pool: &DbPool,
    accrual_id: AccrualId,
    as_of: NaiveDate,
) -> Result<Vec<PendingEntry>, RuleError> {
    let accrual = kontera_storage::get_accrual(pool, accrual_id).await?.ok_or(RuleError::AccrualNotFound)?;
    let booked = kontera_storage::booked_period_numbers(pool, accrual_id).await?;

    let mut pending = Vec::new();
    for n in 1..=accrual.periods {
        if booked.contains(&n) {
            continue;
        }
        let date = period_date(&accrual, n);
        if date > as_of {
            break;
        }
        pending.push(PendingEntry { period_number: n, period_date: date, amount: generate_entry(&accrual, n) });
    }
    Ok(pending)
}

/// Posts every not-yet-booked period of one accrual up to `as_of`.
/// Idempotent per period via `INSERT OR IGNORE` on `accrual_entries`.
/// Deactivates the accrual once every period has been booked.
pub async fn run_accrual(
    pool: &DbPool,
    engine: &PostingEngine,
    company_id: CompanyId,
    fiscal_year_id: FiscalYearId,
    accrual_id: AccrualId,
    as_of: NaiveDate,
) -> Result<usize, RuleError> {
    let accrual = kontera_storage::get_accrual(pool, accrual_id).await?.ok_or(RuleError::AccrualNotFound)?;
    let pending = get_pending_entries(pool, accrual_id, as_of).await?;
    let mut posted = 0;

    for entry in pending {
        if entry.amount.is_zero() {
            continue;
        }
        let lines = posting_lines(&accrual, entry.amount);
        let description = format!("Periodisering {} ({}/{})", accrual.name, entry.period_number, accrual.periods);
        let verification = engine
            .create_verification(company_id, fiscal_year_id, entry.period_date, &description, lines)
            .await?;

        let inserted = kontera_storage::insert_accrual_entry(
            pool,
            accrual_id,
            entry.period_number,
            entry.period_date,
            entry.amount,
            verification.id.map(|id| id.0),
        )
        .await?;
        if inserted {
            posted += 1;
        }
    }

    let booked = kontera_storage::booked_period_numbers(pool, accrual_id).await?;
    if booked.len() as i64 >= accrual.periods {
        kontera_storage::deactivate_accrual(pool, accrual_id).await?;
    }

    Ok(posted)
}

#[derive(Debug, Default, Clone)]
pub struct AccrualRunStats {
    pub posted: usize,
}

/// Runs every active, `auto_generate` accrual of a company up to `as_of`.
pub async fn run_auto_accruals(
    pool: &DbPool,
    engine: &PostingEngine,
    company_id: CompanyId,
    fiscal_year_id: FiscalYearId,
    as_of: NaiveDate,
) -> Result<AccrualRunStats, RuleError> {
    let mut stats = AccrualRunStats::default();
    for accrual in kontera_storage::list_accruals(pool, company_id, true).await? {
        if !accrual.auto_generate {
            continue;
        }
        let id = accrual.id.ok_or(RuleError::AccrualNotFound)?;
        stats.posted += run_accrual(pool, engine, company_id, fiscal_year_id, id, as_of).await?;
    }
    Ok(stats)
}
