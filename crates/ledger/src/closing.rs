use chrono::NaiveDate;
use kontera_core::{AccountClass, CompanyId, FiscalYearId, Money, Verification, VerificationLine};
use kontera_storage::DbPool;

use crate::balance::{period_result, trial_balance};
use crate::error::LedgerError;
use crate::posting::PostingEngine;

/// Result of validating a company's books as of a cutoff date, per §4.4.
#[derive(Debug, Clone)]
pub struct ClosingValidation {
    pub debit_total: Money,
    pub credit_total: Money,
    pub has_activity: bool,
    pub key_accounts_present: bool,
}

impl ClosingValidation {
    pub fn trial_balance_ok(&self) -> bool {
        self.debit_total == self.credit_total
    }
}

/// Runs the trial-balance check (hard) plus the activity and key-account
/// warnings (soft) for a company as of `cutoff`.
pub async fn validate(
    pool: &DbPool,
    company_id: CompanyId,
    cutoff: NaiveDate,
) -> Result<ClosingValidation, LedgerError> {
    let rows = trial_balance(pool, company_id, cutoff).await?;
    let debit_total: Money = rows.iter().map(|r| r.debit_col).sum();
    let credit_total: Money = rows.iter().map(|r| r.credit_col).sum();

    let has_activity = !rows.is_empty();

    let accounts = kontera_storage::list_accounts(pool, company_id).await?;
    let key_accounts_present = accounts.iter().any(|a| a.number == "2099")
        && accounts.iter().any(|a| a.number == "2098");

    Ok(ClosingValidation { debit_total, credit_total, has_activity, key_accounts_present })
}

/// Posts the annual result-disposition verification (§4.4): debits/credits
/// 2099 ("Årets resultat") against 2098 ("Balanserat resultat") for the
/// absolute period result. Returns `None` without posting when the result
/// is exactly zero.
pub async fn disposition(
    engine: &PostingEngine,
    company_id: CompanyId,
    fiscal_year_id: FiscalYearId,
    d_end: NaiveDate,
) -> Result<Option<Verification>, LedgerError> {
    let r = period_result(engine.pool(), company_id, d_end).await?;
    if r.is_zero() {
        return Ok(None);
    }

    let arets_resultat = kontera_storage::get_account_by_number(engine.pool(), company_id, "2099")
        .await?
        .and_then(|a| a.id)
        .ok_or(LedgerError::NotFound)?;
    let balanserat_resultat =
        kontera_storage::get_account_by_number(engine.pool(), company_id, "2098")
            .await?
            .and_then(|a| a.id)
            .ok_or(LedgerError::NotFound)?;

    let amount = r.abs();
    let lines = if r.is_positive() {
        vec![
            VerificationLine::debit(arets_resultat, amount),
            VerificationLine::credit(balanserat_resultat, amount),
        ]
    } else {
        vec![
            VerificationLine::debit(balanserat_resultat, amount),
            VerificationLine::credit(arets_resultat, amount),
        ]
    };

    let verification = engine
        .create_verification(
            company_id,
            fiscal_year_id,
            d_end,
            "Årets resultat - disposition",
            lines,
        )
        .await?;

    Ok(Some(verification))
}

/// `validate(d_end) -> disposition -> mark closed`, per §4.4's closing
/// transition. Fails the trial-balance check hard; activity and
/// key-account warnings are logged but do not block the close.
pub async fn close_fiscal_year(
    engine: &PostingEngine,
    company_id: CompanyId,
    fiscal_year_id: FiscalYearId,
    d_end: NaiveDate,
) -> Result<Option<Verification>, LedgerError> {
    let check = validate(engine.pool(), company_id, d_end).await?;
    if !check.trial_balance_ok() {
        return Err(LedgerError::Balance(check.debit_total, check.credit_total));
    }
    if !check.has_activity {
        tracing::warn!(?company_id, "closing a fiscal year with no bookings");
    }
    if !check.key_accounts_present {
        tracing::warn!(?company_id, "2099/2098 missing, skipping result disposition");
        kontera_storage::set_fiscal_year_closed(engine.pool(), fiscal_year_id, true).await?;
        return Ok(None);
    }

    let closing_entry = disposition(engine, company_id, fiscal_year_id, d_end).await?;
    kontera_storage::set_fiscal_year_closed(engine.pool(), fiscal_year_id, true).await?;

    tracing::info!(?company_id, ?fiscal_year_id, "fiscal year closed");
    Ok(closing_entry)
}

/// Carries class 1/2 balances from `source_fy` forward onto the matching
/// accounts' opening balance, as of `source_fy`'s end date. Result accounts
/// (class 3-8) are never carried. Idempotent: re-running sets the same
/// values again.
pub async fn create_opening_balances(
    pool: &DbPool,
    source_fy: FiscalYearId,
    target_fy: FiscalYearId,
) -> Result<usize, LedgerError> {
    let source = kontera_storage::get_fiscal_year(pool, source_fy)
        .await?
        .ok_or(LedgerError::NotFound)?;
    let target = kontera_storage::get_fiscal_year(pool, target_fy)
        .await?
        .ok_or(LedgerError::NotFound)?;
    if source.company_id != target.company_id {
        return Err(LedgerError::NotFound);
    }

    let accounts = kontera_storage::list_accounts(pool, source.company_id).await?;
    let mut carried = 0;

    for account in accounts {
        let Some(class) = AccountClass::of(&account.number) else { continue };
        if !class.is_balance_sheet() {
            continue;
        }
        let account_id = account.id.ok_or(LedgerError::NotFound)?;
        let (debit, credit) =
            kontera_storage::line_sums_for_account(pool, account_id, source.end_date()).await?;
        let balance = Money::balance(account.opening_balance, debit, credit);
        kontera_storage::set_account_opening_balance(pool, account_id, balance).await?;
        carried += 1;
    }

    Ok(carried)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kontera_core::{Account, AccountType, Company, FiscalYear};

    async fn setup() -> (
        tempfile::TempDir,
        PostingEngine,
        CompanyId,
        FiscalYearId,
        FiscalYearId,
        kontera_core::AccountId,
        kontera_core::AccountId,
        kontera_core::AccountId,
        kontera_core::AccountId,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let pool = kontera_storage::create_db(&dir.path().join("closing.db")).await.unwrap();

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
        let arets_resultat = kontera_storage::insert_account(
            &pool,
            &Account::new(company_id, "2099", "Årets resultat", AccountType::Equity),
        )
        .await
        .unwrap();
        let balanserat_resultat = kontera_storage::insert_account(
            &pool,
            &Account::new(company_id, "2098", "Balanserat resultat", AccountType::Equity),
        )
        .await
        .unwrap();

        let fy_2024 = FiscalYear::new(
            company_id,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        );
        let fy_2024_id = kontera_storage::insert_fiscal_year(&pool, &fy_2024).await.unwrap();

        let fy_2025 = FiscalYear::new(
            company_id,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
        );
        let fy_2025_id = kontera_storage::insert_fiscal_year(&pool, &fy_2025).await.unwrap();

        let engine = PostingEngine::new(pool);
        (
            dir,
            engine,
            company_id,
            fy_2024_id,
            fy_2025_id,
            bank,
            sales,
            arets_resultat,
            balanserat_resultat,
        )
    }

    #[tokio::test]
    async fn closes_year_and_posts_disposition() {
        let (_dir, engine, company_id, fy_2024_id, _fy_2025_id, bank, sales, arets_resultat, balanserat_resultat) =
            setup().await;

        engine
            .create_verification(
                company_id,
                fy_2024_id,
                NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                "Cash sale",
                vec![
                    VerificationLine::debit(bank, Money::from_ore(5_000_000)),
                    VerificationLine::credit(sales, Money::from_ore(5_000_000)),
                ],
            )
            .await
            .unwrap();

        let closing_entry = close_fiscal_year(
            &engine,
            company_id,
            fy_2024_id,
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        )
        .await
        .unwrap()
        .expect("non-zero result posts a disposition entry");

        assert_eq!(closing_entry.total(), Money::from_ore(5_000_000));

        let fy = kontera_storage::get_fiscal_year(engine.pool(), fy_2024_id).await.unwrap().unwrap();
        assert!(fy.is_closed);

        let arets_balance =
            crate::balance::account_balance(
                engine.pool(),
                &kontera_storage::get_account(engine.pool(), arets_resultat).await.unwrap().unwrap(),
                NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(arets_balance, Money::zero());

        let balanserat_balance =
            crate::balance::account_balance(
                engine.pool(),
                &kontera_storage::get_account(engine.pool(), balanserat_resultat).await.unwrap().unwrap(),
                NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(balanserat_balance, Money::from_ore(-5_000_000));
    }

    #[tokio::test]
    async fn opening_balance_carry_is_idempotent() {
        let (_dir, engine, company_id, fy_2024_id, fy_2025_id, bank, sales, _ar, _br) = setup().await;

        engine
            .create_verification(
                company_id,
                fy_2024_id,
                NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                "Cash sale",
                vec![
                    VerificationLine::debit(bank, Money::from_ore(100_000)),
                    VerificationLine::credit(sales, Money::from_ore(100_000)),
                ],
            )
            .await
            .unwrap();

        let first = create_opening_balances(engine.pool(), fy_2024_id, fy_2025_id).await.unwrap();
        assert_eq!(first, 3); // the two 2xxx accounts plus the 1xxx account carry; 3xxx does not

        let bank_account = kontera_storage::get_account(engine.pool(), bank).await.unwrap().unwrap();
        assert_eq!(bank_account.opening_balance, Money::from_ore(100_000));

        let second = create_opening_balances(engine.pool(), fy_2024_id, fy_2025_id).await.unwrap();
        assert_eq!(second, 3);

        let bank_account_again =
            kontera_storage::get_account(engine.pool(), bank).await.unwrap().unwrap();
        assert_eq!(bank_account_again.opening_balance, Money::from_ore(100_000));
    }
}
