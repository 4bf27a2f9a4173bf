use chrono::NaiveDate;
use kontera_core::{
    AccountId, CompanyId, FiscalYearId, UnvalidatedVerification, Verification, VerificationId,
    VerificationLine,
};
use kontera_storage::DbPool;
use tokio::sync::Mutex;

use crate::error::LedgerError;

/// The sole write path for verifications. Holds an in-process write lock so
/// that validate -> allocate-number -> insert -> commit is serialized per
/// store handle, matching the single-writer/many-readers model in §5.
pub struct PostingEngine {
    pool: DbPool,
    write_lock: Mutex<()>,
}

impl PostingEngine {
    pub fn new(pool: DbPool) -> Self {
        PostingEngine { pool, write_lock: Mutex::new(()) }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Validates and persists a new verification. Returns without writing
    /// anything on any validation failure.
    pub async fn create_verification(
        &self,
        company_id: CompanyId,
        fiscal_year_id: FiscalYearId,
        transaction_date: NaiveDate,
        description: &str,
        lines: Vec<VerificationLine>,
    ) -> Result<Verification, LedgerError> {
        let _guard = self.write_lock.lock().await;

        let fy = kontera_storage::get_fiscal_year(&self.pool, fiscal_year_id)
            .await?
            .ok_or(LedgerError::NotFound)?;

        if fy.is_closed {
            return Err(LedgerError::ClosedYear(fiscal_year_id));
        }
        if !fy.contains(transaction_date) {
            return Err(LedgerError::Period {
                date: transaction_date,
                start: fy.start_date(),
                end: fy.end_date(),
            });
        }

        let draft = UnvalidatedVerification {
            company_id,
            fiscal_year_id,
            transaction_date,
            description: description.to_string(),
            lines,
        };

        if draft.non_zero_line_count() < 2 {
            return Err(LedgerError::EmptyVerification);
        }

        let total_debits = draft.total_debits();
        let total_credits = draft.total_credits();
        if total_debits != total_credits {
            return Err(LedgerError::Balance(total_debits, total_credits));
        }
        if total_debits.is_zero() {
            return Err(LedgerError::Balance(total_debits, total_credits));
        }

        for line in &draft.lines {
            self.check_account_ownership(company_id, line.account_id).await?;
        }

        let number =
            kontera_storage::next_verification_number(&self.pool, company_id, fiscal_year_id)
                .await?;

        let id = kontera_storage::insert_verification(
            &self.pool,
            company_id,
            fiscal_year_id,
            number,
            transaction_date,
            &draft.description,
            &draft.lines,
        )
        .await?;

        tracing::debug!(verification_id = id.0, number, "created verification");

        kontera_storage::get_verification(&self.pool, id)
            .await?
            .ok_or(LedgerError::NotFound)
    }

    async fn check_account_ownership(
        &self,
        company_id: CompanyId,
        account_id: AccountId,
    ) -> Result<(), LedgerError> {
        let account = kontera_storage::get_account(&self.pool, account_id)
            .await?
            .ok_or(LedgerError::Account(account_id))?;
        if account.company_id != company_id {
            return Err(LedgerError::Account(account_id));
        }
        Ok(())
    }

    /// Whether a verification's current line set sums to zero. Amendments
    /// may leave a verification transiently unbalanced (§4.1); this is the
    /// explicit query callers must use before relying on balanced state.
    pub async fn is_balanced(&self, id: VerificationId) -> Result<bool, LedgerError> {
        let verification = kontera_storage::get_verification(&self.pool, id)
            .await?
            .ok_or(LedgerError::VerificationNotFound(id))?;
        let debit: kontera_core::Money = verification.lines.iter().map(|l| l.debit).sum();
        let credit: kontera_core::Money = verification.lines.iter().map(|l| l.credit).sum();
        Ok(debit == credit)
    }

    pub async fn add_line(
        &self,
        verification_id: VerificationId,
        line: VerificationLine,
    ) -> Result<(), LedgerError> {
        let _guard = self.write_lock.lock().await;
        kontera_storage::add_line(&self.pool, verification_id, &line).await?;
        Ok(())
    }

    pub async fn delete_line(
        &self,
        verification_id: VerificationId,
        line_order: i64,
    ) -> Result<(), LedgerError> {
        let _guard = self.write_lock.lock().await;
        kontera_storage::delete_line(&self.pool, verification_id, line_order).await?;
        Ok(())
    }

    pub async fn update_header(
        &self,
        verification_id: VerificationId,
        transaction_date: NaiveDate,
        description: &str,
    ) -> Result<(), LedgerError> {
        let _guard = self.write_lock.lock().await;
        kontera_storage::update_verification_header(
            &self.pool,
            verification_id,
            transaction_date,
            description,
        )
        .await?;
        Ok(())
    }

    pub async fn delete_verification(&self, id: VerificationId) -> Result<(), LedgerError> {
        let _guard = self.write_lock.lock().await;
        kontera_storage::delete_verification(&self.pool, id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kontera_core::{Account, AccountType, Company, FiscalYear};

    async fn setup() -> (tempfile::TempDir, PostingEngine, CompanyId, FiscalYearId, AccountId, AccountId) {
        let dir = tempfile::tempdir().unwrap();
        let pool = kontera_storage::create_db(&dir.path().join("test.db")).await.unwrap();

        let company_id = kontera_storage::insert_company(&pool, &Company::new("Test AB", "556123-4567"))
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

        (dir, PostingEngine::new(pool), company_id, fiscal_year_id, bank, sales)
    }

    #[tokio::test]
    async fn cash_sale_creates_balanced_verification() {
        let (_dir, engine, company_id, fiscal_year_id, bank, sales) = setup().await;

        let lines = vec![
            VerificationLine::debit(bank, kontera_core::Money::from_ore(100000)),
            VerificationLine::credit(sales, kontera_core::Money::from_ore(100000)),
        ];

        let v = engine
            .create_verification(
                company_id,
                fiscal_year_id,
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                "Cash sale",
                lines,
            )
            .await
            .unwrap();

        assert_eq!(v.number, 1);
        assert_eq!(v.total(), kontera_core::Money::from_ore(100000));
    }

    #[tokio::test]
    async fn unbalanced_lines_rejected() {
        let (_dir, engine, company_id, fiscal_year_id, bank, sales) = setup().await;

        let lines = vec![
            VerificationLine::debit(bank, kontera_core::Money::from_ore(100000)),
            VerificationLine::credit(sales, kontera_core::Money::from_ore(90000)),
        ];

        let err = engine
            .create_verification(
                company_id,
                fiscal_year_id,
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                "Bad entry",
                lines,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::Balance(_, _)));
    }

    #[tokio::test]
    async fn zero_amount_verification_rejected() {
        let (_dir, engine, company_id, fiscal_year_id, bank, sales) = setup().await;

        let lines = vec![
            VerificationLine::debit(bank, kontera_core::Money::zero()),
            VerificationLine::credit(sales, kontera_core::Money::zero()),
        ];

        let err = engine
            .create_verification(
                company_id,
                fiscal_year_id,
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                "Zero",
                lines,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::Balance(_, _)));
    }

    #[tokio::test]
    async fn verification_numbers_are_dense_per_fiscal_year() {
        let (_dir, engine, company_id, fiscal_year_id, bank, sales) = setup().await;

        for _ in 0..3 {
            let lines = vec![
                VerificationLine::debit(bank, kontera_core::Money::from_ore(1000)),
                VerificationLine::credit(sales, kontera_core::Money::from_ore(1000)),
            ];
            engine
                .create_verification(
                    company_id,
                    fiscal_year_id,
                    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                    "Repeat",
                    lines,
                )
                .await
                .unwrap();
        }

        let all =
            kontera_storage::list_verifications(engine.pool(), company_id, fiscal_year_id)
                .await
                .unwrap();
        let mut numbers: Vec<i64> = all.iter().map(|v| v.number).collect();
        numbers.sort();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn date_outside_fiscal_year_rejected() {
        let (_dir, engine, company_id, fiscal_year_id, bank, sales) = setup().await;

        let lines = vec![
            VerificationLine::debit(bank, kontera_core::Money::from_ore(1000)),
            VerificationLine::credit(sales, kontera_core::Money::from_ore(1000)),
        ];

        let err = engine
            .create_verification(
                company_id,
                fiscal_year_id,
                NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                "Out of range",
                lines,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::Period { .. }));
    }
}
