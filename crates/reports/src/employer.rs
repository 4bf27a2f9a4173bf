use chrono::NaiveDate;
use kontera_core::{CompanyId, Money};
use kontera_storage::DbPool;
use rust_decimal::Decimal;

use crate::error::ReportError;

const CONTRIBUTION_RATE: &str = "31.42";

/// Arbetsgivardeklaration (AGI): salary, employer contributions, withholding
/// tax, and the total payable to Skatteverket for the period.
#[derive(Debug, Clone)]
pub struct EmployerReport {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub gross_salary: Money,
    pub vacation_pay: Money,
    pub total_salary_base: Money,
    pub calculated_contributions: Money,
    pub contribution_rate: Decimal,
    pub withholding_tax: Money,
    pub employer_contributions: Money,
    pub total_to_pay: Money,
}

pub async fn generate(
    pool: &DbPool,
    company_id: CompanyId,
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> Result<EmployerReport, ReportError> {
    let (gross_salary, _) = kontera_storage::period_sums_for_prefix(pool, company_id, "70", period_start, period_end).await?;
    let (vacation_pay, _) = kontera_storage::period_sums_for_prefix(pool, company_id, "702", period_start, period_end).await?;

    let total_salary_base = gross_salary;
    let rate = Decimal::from_str_exact(CONTRIBUTION_RATE).expect("valid literal rate");
    let calculated_contributions = total_salary_base.percentage(rate);

    let (withholding_debit, withholding_credit) =
        kontera_storage::period_sums_for_prefix(pool, company_id, "2710", period_start, period_end).await?;
    let withholding_tax = withholding_credit - withholding_debit;

    let (contrib_debit, contrib_credit) =
        kontera_storage::period_sums_for_prefix(pool, company_id, "273", period_start, period_end).await?;
    let employer_contributions = contrib_credit - contrib_debit;

    let total_to_pay = withholding_tax + employer_contributions;

    Ok(EmployerReport {
        period_start,
        period_end,
        gross_salary,
        vacation_pay,
        total_salary_base,
        calculated_contributions,
        contribution_rate: rate,
        withholding_tax,
        employer_contributions,
        total_to_pay,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kontera_core::{Account, AccountType, Company, FiscalYear, VerificationLine};
    use kontera_ledger::PostingEngine;

    #[tokio::test]
    async fn salary_run_computes_contribution_and_totals() {
        let dir = tempfile::tempdir().unwrap();
        let pool = kontera_storage::create_db(&dir.path().join("test.db")).await.unwrap();
        let company_id = kontera_storage::insert_company(&pool, &Company::new("Test AB", "556123-4567")).await.unwrap();
        let fy = FiscalYear::new(
            company_id,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        );
        let fiscal_year_id = kontera_storage::insert_fiscal_year(&pool, &fy).await.unwrap();

        let salary = kontera_storage::insert_account(&pool, &Account::new(company_id, "7010", "Löner", AccountType::Expense)).await.unwrap();
        let withholding = kontera_storage::insert_account(&pool, &Account::new(company_id, "2710", "Personalens källskatt", AccountType::Liability)).await.unwrap();
        let bank = kontera_storage::insert_account(&pool, &Account::new(company_id, "1930", "Företagskonto", AccountType::Asset)).await.unwrap();

        let engine = PostingEngine::new(pool.clone());
        engine
            .create_verification(
                company_id,
                fiscal_year_id,
                NaiveDate::from_ymd_opt(2024, 1, 25).unwrap(),
                "Löneutbetalning",
                vec![
                    VerificationLine::debit(salary, Money::from_ore(10_000_00)),
                    VerificationLine::credit(withholding, Money::from_ore(3_000_00)),
                    VerificationLine::credit(bank, Money::from_ore(7_000_00)),
                ],
            )
            .await
            .unwrap();

        let report = generate(
            &pool,
            company_id,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
        .await
        .unwrap();

        assert_eq!(report.gross_salary, Money::from_ore(10_000_00));
        assert_eq!(report.withholding_tax, Money::from_ore(3_000_00));
        assert_eq!(report.calculated_contributions, Money::from_ore(3_142_00));
        assert_eq!(report.total_to_pay, Money::from_ore(3_000_00));
    }
}
