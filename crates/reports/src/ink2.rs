use chrono::NaiveDate;
use kontera_core::{CompanyId, Money};
use kontera_storage::DbPool;
use rust_decimal::Decimal;

use crate::error::ReportError;

const TAX_RATE: &str = "20.6";

/// One named BAS account-class group used by the INK2 breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    Revenue,
    GoodsCost,
    OtherExternal,
    Personnel,
    Depreciation,
    OtherOperating,
    FinancialIncome,
    FinancialExpense,
    Extraordinary,
    Tax,
    IntangibleAssets,
    Tangible,
    FinancialAssets,
    Inventory,
    Receivables,
    Cash,
    Equity,
    Provisions,
    LongTermDebt,
    ShortTermDebt,
}

impl Group {
    pub fn name(self) -> &'static str {
        match self {
            Group::Revenue => "revenue",
            Group::GoodsCost => "goods_cost",
            Group::OtherExternal => "other_external",
            Group::Personnel => "personnel",
            Group::Depreciation => "depreciation",
            Group::OtherOperating => "other_operating",
            Group::FinancialIncome => "financial_income",
            Group::FinancialExpense => "financial_expense",
            Group::Extraordinary => "extraordinary",
            Group::Tax => "tax",
            Group::IntangibleAssets => "intangible_assets",
            Group::Tangible => "tangible",
            Group::FinancialAssets => "financial_assets",
            Group::Inventory => "inventory",
            Group::Receivables => "receivables",
            Group::Cash => "cash",
            Group::Equity => "equity",
            Group::Provisions => "provisions",
            Group::LongTermDebt => "long_term_debt",
            Group::ShortTermDebt => "short_term_debt",
        }
    }

    /// Whether this group contributes to the pre-tax result (the income
    /// statement classes) as opposed to a balance sheet position.
    fn is_result_group(self) -> bool {
        !matches!(
            self,
            Group::IntangibleAssets
                | Group::Tangible
                | Group::FinancialAssets
                | Group::Inventory
                | Group::Receivables
                | Group::Cash
                | Group::Equity
                | Group::Provisions
                | Group::LongTermDebt
                | Group::ShortTermDebt
        )
    }

    fn prefixes(self) -> Vec<String> {
        fn range(a: u8, b: u8) -> Vec<String> {
            (a..=b).map(|n| format!("{n:02}")).collect()
        }
        match self {
            Group::Revenue => range(30, 39),
            Group::GoodsCost => range(40, 49),
            Group::OtherExternal => range(50, 69),
            Group::Personnel => range(70, 76),
            Group::Depreciation => range(78, 78),
            Group::OtherOperating => vec!["77".to_string(), "79".to_string()],
            Group::FinancialIncome => range(80, 83),
            Group::FinancialExpense => range(84, 84),
            Group::Extraordinary => range(85, 88),
            Group::Tax => range(89, 89),
            Group::IntangibleAssets => range(10, 10),
            Group::Tangible => range(11, 12),
            Group::FinancialAssets => range(13, 13),
            Group::Inventory => range(14, 14),
            Group::Receivables => range(15, 17),
            Group::Cash => range(19, 19),
            Group::Equity => range(20, 20),
            Group::Provisions => range(22, 23),
            Group::LongTermDebt => range(24, 24),
            Group::ShortTermDebt => range(25, 29),
        }
    }

    pub fn all() -> [Group; 20] {
        [
            Group::Revenue,
            Group::GoodsCost,
            Group::OtherExternal,
            Group::Personnel,
            Group::Depreciation,
            Group::OtherOperating,
            Group::FinancialIncome,
            Group::FinancialExpense,
            Group::Extraordinary,
            Group::Tax,
            Group::IntangibleAssets,
            Group::Tangible,
            Group::FinancialAssets,
            Group::Inventory,
            Group::Receivables,
            Group::Cash,
            Group::Equity,
            Group::Provisions,
            Group::LongTermDebt,
            Group::ShortTermDebt,
        ]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GroupNet {
    pub group: Group,
    /// Credit minus debit over the period, uniform across every group (a
    /// revenue group's net is its contribution to profit; a cost group's net
    /// is the same formula, naturally negative).
    pub net: Money,
}

#[derive(Debug, Clone)]
pub struct Ink2Report {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub groups: Vec<GroupNet>,
    /// Result before tax: the sum of every income-statement group (classes
    /// 3-8) excluding the `tax` group itself.
    pub taxable_income: Money,
    pub tax_rate: Decimal,
    pub tax: Money,
}

async fn group_net(
    pool: &DbPool,
    company_id: CompanyId,
    group: Group,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Money, ReportError> {
    let mut net = Money::zero();
    for prefix in group.prefixes() {
        let (debit, credit) = kontera_storage::period_sums_for_prefix(pool, company_id, &prefix, start, end).await?;
        net = net + (credit - debit);
    }
    Ok(net)
}

pub async fn generate(
    pool: &DbPool,
    company_id: CompanyId,
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> Result<Ink2Report, ReportError> {
    let mut groups = Vec::with_capacity(Group::all().len());
    let mut taxable_income = Money::zero();

    for group in Group::all() {
        let net = group_net(pool, company_id, group, period_start, period_end).await?;
        if group.is_result_group() && group != Group::Tax {
            taxable_income = taxable_income + net;
        }
        groups.push(GroupNet { group, net });
    }

    let tax_rate = Decimal::from_str_exact(TAX_RATE).expect("valid literal rate");
    let tax = if taxable_income.is_positive() { taxable_income.percentage(tax_rate) } else { Money::zero() };

    Ok(Ink2Report { period_start, period_end, groups, taxable_income, tax_rate, tax })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kontera_core::{Account, AccountType, Company, FiscalYear, VerificationLine};
    use kontera_ledger::PostingEngine;

    #[tokio::test]
    async fn profitable_period_computes_tax_and_excludes_the_tax_group() {
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
        let tax_expense = kontera_storage::insert_account(&pool, &Account::new(company_id, "8910", "Skatt på årets resultat", AccountType::Expense)).await.unwrap();

        let engine = PostingEngine::new(pool.clone());
        engine
            .create_verification(
                company_id,
                fiscal_year_id,
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                "Försäljning",
                vec![
                    VerificationLine::debit(bank, Money::from_ore(100_000_00)),
                    VerificationLine::credit(sales, Money::from_ore(100_000_00)),
                ],
            )
            .await
            .unwrap();
        engine
            .create_verification(
                company_id,
                fiscal_year_id,
                NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
                "Beräknad skatt",
                vec![
                    VerificationLine::debit(tax_expense, Money::from_ore(20_600_00)),
                    VerificationLine::credit(bank, Money::from_ore(20_600_00)),
                ],
            )
            .await
            .unwrap();

        let report = generate(
            &pool,
            company_id,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        )
        .await
        .unwrap();

        assert_eq!(report.taxable_income, Money::from_ore(100_000_00));
        assert_eq!(report.tax, Money::from_ore(20_600_00));
    }
}
