use chrono::NaiveDate;
use kontera_core::{Account, AccountClass, AccountType, CompanyId, Money};
use kontera_storage::DbPool;

use crate::error::LedgerError;

/// One row of a trial balance.
#[derive(Debug, Clone)]
pub struct TrialBalanceRow {
    pub number: String,
    pub name: String,
    pub account_type: AccountType,
    pub signed_balance: Money,
    pub debit_col: Money,
    pub credit_col: Money,
}

/// Signed balance `ob + debit - credit` for a single account as of `cutoff`
/// (inclusive). Uniform across every account class — see §4.2/§9.
pub async fn account_balance(
    pool: &DbPool,
    account: &Account,
    cutoff: NaiveDate,
) -> Result<Money, LedgerError> {
    let account_id = account.id.ok_or(LedgerError::NotFound)?;
    let (debit, credit) = kontera_storage::line_sums_for_account(pool, account_id, cutoff).await?;
    Ok(Money::balance(account.opening_balance, debit, credit))
}

/// All non-zero account balances for a company as of `cutoff`, in the shape
/// of §4.2's trial balance. `Sum debit_col == Sum credit_col` always holds.
pub async fn trial_balance(
    pool: &DbPool,
    company_id: CompanyId,
    cutoff: NaiveDate,
) -> Result<Vec<TrialBalanceRow>, LedgerError> {
    let accounts = kontera_storage::list_accounts(pool, company_id).await?;
    let mut rows = Vec::new();

    for account in accounts {
        let balance = account_balance(pool, &account, cutoff).await?;
        if balance.is_zero() {
            continue;
        }
        let zero = Money::zero();
        rows.push(TrialBalanceRow {
            number: account.number,
            name: account.name,
            account_type: account.account_type,
            signed_balance: balance,
            debit_col: if balance.is_positive() { balance } else { zero },
            credit_col: if balance.is_negative() { -balance } else { zero },
        });
    }

    Ok(rows)
}

/// `revenue_class3 - expense_classes4to8`, sign-normalised so positive means
/// profit.
pub async fn period_result(
    pool: &DbPool,
    company_id: CompanyId,
    cutoff: NaiveDate,
) -> Result<Money, LedgerError> {
    let accounts = kontera_storage::list_accounts(pool, company_id).await?;
    let mut revenue = Money::zero();
    let mut expense = Money::zero();

    for account in accounts {
        let Some(class) = AccountClass::of(&account.number) else { continue };
        if !class.is_result() {
            continue;
        }
        let balance = account_balance(pool, &account, cutoff).await?;
        match class.0 {
            3 => revenue = revenue - balance,
            4..=8 => expense = expense + balance,
            _ => {}
        }
    }

    Ok(revenue - expense)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use kontera_core::{Account, AccountType, Company, FiscalYear, VerificationLine};
    use kontera_storage::create_db;

    use crate::posting::PostingEngine;

    #[tokio::test]
    async fn trial_balance_columns_balance() {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_db(&dir.path().join("tb.db")).await.unwrap();

        let company_id =
            kontera_storage::insert_company(&pool, &Company::new("Test AB", "556123-4567"))
                .await
                .unwrap();
        let bank = kontera_storage::insert_account(
            &pool,
            &Account::new(company_id, "1930", "Företagskonto", AccountType::Asset),
        )
        .await
        .unwrap();
        let sales = kontera_storage::insert_account(
            &pool,
            &Account::new(company_id, "3010", "Försäljning", AccountType::Revenue),
        )
        .await
        .unwrap();

        let fy = FiscalYear::new(
            company_id,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        );
        let fiscal_year_id = kontera_storage::insert_fiscal_year(&pool, &fy).await.unwrap();

        let engine = PostingEngine::new(pool.clone());
        engine
            .create_verification(
                company_id,
                fiscal_year_id,
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                "Cash sale",
                vec![
                    VerificationLine::debit(bank, Money::from_ore(100000)),
                    VerificationLine::credit(sales, Money::from_ore(100000)),
                ],
            )
            .await
            .unwrap();

        let rows = trial_balance(
            &pool,
            company_id,
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        )
        .await
        .unwrap();

        let total_debit: Money = rows.iter().map(|r| r.debit_col).sum();
        let total_credit: Money = rows.iter().map(|r| r.credit_col).sum();
        assert_eq!(total_debit, total_credit);
        assert_eq!(total_debit, Money::from_ore(100000));

        let result = period_result(&pool, company_id, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap())
            .await
            .unwrap();
        assert_eq!(result, Money::from_ore(100000));
    }

    #[tokio::test]
    async fn period_result_is_negative_when_expenses_exceed_revenue() {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_db(&dir.path().join("expense.db")).await.unwrap();

        let company_id =
            kontera_storage::insert_company(&pool, &Company::new("Test AB", "556123-4567"))
                .await
                .unwrap();
        let bank = kontera_storage::insert_account(
            &pool,
            &Account::new(company_id, "1930", "Företagskonto", AccountType::Asset),
        )
        .await
        .unwrap();
        let sales = kontera_storage::insert_account(
            &pool,
            &Account::new(company_id, "3010", "Försäljning", AccountType::Revenue),
        )
        .await
        .unwrap();
        let rent = kontera_storage::insert_account(
            &pool,
            &Account::new(company_id, "5010", "Lokalhyra", AccountType::Expense),
        )
        .await
        .unwrap();

        let fy = FiscalYear::new(
            company_id,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        );
        let fiscal_year_id = kontera_storage::insert_fiscal_year(&pool, &fy).await.unwrap();

        let engine = PostingEngine::new(pool.clone());
        engine
            .create_verification(
                company_id,
                fiscal_year_id,
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                "Cash sale",
                vec![
                    VerificationLine::debit(bank, Money::from_ore(500)),
                    VerificationLine::credit(sales, Money::from_ore(500)),
                ],
            )
            .await
            .unwrap();
        engine
            .create_verification(
                company_id,
                fiscal_year_id,
                NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
                "Rent expense",
                vec![
                    VerificationLine::debit(rent, Money::from_ore(1000)),
                    VerificationLine::credit(bank, Money::from_ore(1000)),
                ],
            )
            .await
            .unwrap();

        let result = period_result(&pool, company_id, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap())
            .await
            .unwrap();
        assert_eq!(result, Money::from_ore(-500));
    }
}
