use chrono::NaiveDate;
use kontera_core::{CompanyId, Money};
use kontera_storage::DbPool;

use crate::error::ReportError;

/// Momsdeklaration (SKV 4700), boxes 05/10/11/12/48/49.
#[derive(Debug, Clone)]
pub struct VatReport {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    /// Box 05: taxable sales excluding VAT.
    pub sales_excl_vat: Money,
    /// Box 10: output VAT at 25%.
    pub output_vat_25: Money,
    /// Box 11: output VAT at 12%.
    pub output_vat_12: Money,
    /// Box 12: output VAT at 6%.
    pub output_vat_6: Money,
    pub total_output_vat: Money,
    /// Box 48: input VAT.
    pub input_vat: Money,
    /// Box 49: payable (positive) or refundable (negative).
    pub vat_to_pay: Money,
}

async fn net(pool: &DbPool, company_id: CompanyId, account: &str, start: NaiveDate, end: NaiveDate) -> Result<Money, ReportError> {
    let (debit, credit) = kontera_storage::period_sums_for_prefix(pool, company_id, account, start, end).await?;
    Ok(credit - debit)
}

pub async fn generate(
    pool: &DbPool,
    company_id: CompanyId,
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> Result<VatReport, ReportError> {
    let sales_excl_vat = net(pool, company_id, "3", period_start, period_end).await?;
    let output_vat_25 = net(pool, company_id, "2610", period_start, period_end).await?;
    let output_vat_12 = net(pool, company_id, "2620", period_start, period_end).await?;
    let output_vat_6 = net(pool, company_id, "2630", period_start, period_end).await?;

    let (input_debit, _) = kontera_storage::period_sums_for_prefix(pool, company_id, "2640", period_start, period_end).await?;
    let input_vat = input_debit;

    let total_output_vat = output_vat_25 + output_vat_12 + output_vat_6;
    let vat_to_pay = total_output_vat - input_vat;

    Ok(VatReport {
        period_start,
        period_end,
        sales_excl_vat,
        output_vat_25,
        output_vat_12,
        output_vat_6,
        total_output_vat,
        input_vat,
        vat_to_pay,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kontera_core::{Account, AccountType, Company, FiscalYear, VerificationLine};
    use kontera_ledger::PostingEngine;

    #[tokio::test]
    async fn cash_sale_with_output_vat_computes_boxes() {
        let dir = tempfile::tempdir().unwrap();
        let pool = kontera_storage::create_db(&dir.path().join("test.db")).await.unwrap();
        let company_id = kontera_storage::insert_company(&pool, &Company::new("Test AB", "556123-4567")).await.unwrap();
        let fy = FiscalYear::new(
            company_id,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        );
        let fiscal_year_id = kontera_storage::insert_fiscal_year(&pool, &fy).await.unwrap();

        let bank = kontera_storage::insert_account(&pool, &Account::new(company_id, "1930", "Företagskonto", AccountType::Asset)).await.unwrap();
        let sales = kontera_storage::insert_account(&pool, &Account::new(company_id, "3010", "Försäljning", AccountType::Revenue)).await.unwrap();
        let output_vat = kontera_storage::insert_account(&pool, &Account::new(company_id, "2610", "Utgående moms", AccountType::Liability)).await.unwrap();

        let engine = PostingEngine::new(pool.clone());
        engine
            .create_verification(
                company_id,
                fiscal_year_id,
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                "Kontantförsäljning",
                vec![
                    VerificationLine::debit(bank, Money::from_ore(125_000)),
                    VerificationLine::credit(sales, Money::from_ore(100_000)),
                    VerificationLine::credit(output_vat, Money::from_ore(25_000)),
                ],
            )
            .await
            .unwrap();

        let report = generate(
            &pool,
            company_id,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        )
        .await
        .unwrap();

        assert_eq!(report.sales_excl_vat, Money::from_ore(100_000));
        assert_eq!(report.output_vat_25, Money::from_ore(25_000));
        assert_eq!(report.input_vat, Money::zero());
        assert_eq!(report.vat_to_pay, Money::from_ore(25_000));
    }
}
