use kontera_core::{Account, AccountType, Company, CompanyId, FiscalYear, FiscalYearId, Money, VerificationLine};
use kontera_ledger::PostingEngine;
use kontera_storage::DbPool;

use crate::error::SieError;
use crate::parser::SieData;

#[derive(Debug, Default, Clone)]
pub struct ImportStats {
    pub company_created: bool,
    pub accounts_imported: usize,
    pub verifications_imported: usize,
    pub verifications_skipped: usize,
}

/// Imports parsed SIE data into the store. When `company_id` is `None` a new
/// company is created from the file's name/org-number; otherwise the import
/// merges into the given company. Duplicate (company, number) accounts are
/// skipped without overwriting the existing name. Fiscal years with a
/// matching (company, start, end) are reused rather than duplicated.
/// Verifications whose lines don't balance, or resolve to zero mappable
/// lines, are skipped and counted rather than aborting the whole import.
pub async fn import(
    pool: &DbPool,
    engine: &PostingEngine,
    data: &SieData,
    company_id: Option<CompanyId>,
) -> Result<ImportStats, SieError> {
    let mut stats = ImportStats::default();

    let company_id = match company_id {
        Some(id) => id,
        None => {
            let company = Company::new(
                data.company_name.as_deref().unwrap_or("Importerat företag"),
                data.org_number.as_deref().unwrap_or("000000-0000"),
            );
            let id = kontera_storage::insert_company(pool, &company).await?;
            stats.company_created = true;
            id
        }
    };

    stats.accounts_imported = import_accounts(pool, company_id, data).await?;

    let fiscal_year_id = get_or_create_fiscal_year(pool, company_id, data).await?;

    import_opening_balances(pool, company_id, data).await?;

    let (imported, skipped) =
        import_verifications(pool, engine, company_id, fiscal_year_id, data).await?;
    stats.verifications_imported = imported;
    stats.verifications_skipped = skipped;

    Ok(stats)
}

async fn import_accounts(
    pool: &DbPool,
    company_id: CompanyId,
    data: &SieData,
) -> Result<usize, SieError> {
    let mut count = 0;
    for sie_account in &data.accounts {
        if kontera_storage::get_account_by_number(pool, company_id, &sie_account.number)
            .await?
            .is_some()
        {
            continue;
        }
        let account_type = AccountType::infer_from_number(&sie_account.number);
        let account = Account::new(company_id, &sie_account.number, &sie_account.name, account_type);
        kontera_storage::insert_account(pool, &account).await?;
        count += 1;
    }
    Ok(count)
}

async fn get_or_create_fiscal_year(
    pool: &DbPool,
    company_id: CompanyId,
    data: &SieData,
) -> Result<FiscalYearId, SieError> {
    let (start, end) = match (data.fiscal_year_start, data.fiscal_year_end) {
        (Some(s), Some(e)) => (s, e),
        _ => {
            let today = chrono::Local::now().date_naive();
            (
                chrono::NaiveDate::from_ymd_opt(today.format("%Y").to_string().parse().unwrap_or(2000), 1, 1)
                    .expect("Jan 1 is always valid"),
                chrono::NaiveDate::from_ymd_opt(today.format("%Y").to_string().parse().unwrap_or(2000), 12, 31)
                    .expect("Dec 31 is always valid"),
            )
        }
    };

    if let Some(existing) = kontera_storage::find_fiscal_year_by_range(pool, company_id, start, end).await? {
        return Ok(existing.id.expect("fetched fiscal year always has an id"));
    }

    let fy = FiscalYear::new(company_id, start, end);
    kontera_storage::insert_fiscal_year(pool, &fy).await.map_err(SieError::from)
}

async fn import_opening_balances(
    pool: &DbPool,
    company_id: CompanyId,
    data: &SieData,
) -> Result<(), SieError> {
    for (number, balance) in &data.opening_balances {
        if let Some(account) = kontera_storage::get_account_by_number(pool, company_id, number).await? {
            let account_id = account.id.expect("fetched account always has an id");
            kontera_storage::set_account_opening_balance(pool, account_id, *balance).await?;
        }
    }
    Ok(())
}

async fn import_verifications(
    pool: &DbPool,
    engine: &PostingEngine,
    company_id: CompanyId,
    fiscal_year_id: FiscalYearId,
    data: &SieData,
) -> Result<(usize, usize), SieError> {
    let mut imported = 0;
    let mut skipped = 0;

    for sie_ver in &data.verifications {
        let mut lines = Vec::new();
        for sie_line in &sie_ver.lines {
            let Some(account) =
                kontera_storage::get_account_by_number(pool, company_id, &sie_line.account_number).await?
            else {
                continue;
            };
            let account_id = account.id.expect("fetched account always has an id");
            if sie_line.debit.is_positive() {
                lines.push(VerificationLine::debit(account_id, sie_line.debit));
            } else if sie_line.credit.is_positive() {
                lines.push(VerificationLine::credit(account_id, sie_line.credit));
            }
        }

        if lines.is_empty() {
            skipped += 1;
            tracing::warn!(verification_number = sie_ver.number, "no mappable lines, skipping");
            continue;
        }

        let total_debit: Money = lines.iter().map(|l| l.debit).sum();
        let total_credit: Money = lines.iter().map(|l| l.credit).sum();
        if total_debit != total_credit {
            skipped += 1;
            tracing::warn!(verification_number = sie_ver.number, "unbalanced lines, skipping");
            continue;
        }

        match engine
            .create_verification(
                company_id,
                fiscal_year_id,
                sie_ver.date,
                &sie_ver.description,
                lines,
            )
            .await
        {
            Ok(_) => imported += 1,
            Err(err) => {
                skipped += 1;
                tracing::warn!(verification_number = sie_ver.number, error = %err, "rejected by posting engine, skipping");
            }
        }
    }

    Ok((imported, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    const SAMPLE: &str = r#"
#FNAMN "Testbolaget AB"
#ORGNR 556123-4567
#RAR 0 20240101 20241231
#KONTO 1930 "Företagskonto"
#KONTO 3010 "Försäljning"
#VER A 1 20240115 "Kontantförsäljning"
{
#TRANS 1930 {} 1000.00
#TRANS 3010 {} -1000.00
}
"#;

    #[tokio::test]
    async fn imports_a_new_company_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let pool = kontera_storage::create_db(&dir.path().join("import.db")).await.unwrap();
        let engine = PostingEngine::new(pool.clone());

        let data = parse(SAMPLE).unwrap();
        let stats = import(&pool, &engine, &data, None).await.unwrap();

        assert!(stats.company_created);
        assert_eq!(stats.accounts_imported, 2);
        assert_eq!(stats.verifications_imported, 1);
        assert_eq!(stats.verifications_skipped, 0);
    }

    #[tokio::test]
    async fn reimporting_into_the_same_company_skips_duplicate_accounts() {
        let dir = tempfile::tempdir().unwrap();
        let pool = kontera_storage::create_db(&dir.path().join("reimport.db")).await.unwrap();
        let engine = PostingEngine::new(pool.clone());

        let data = parse(SAMPLE).unwrap();
        let first = import(&pool, &engine, &data, None).await.unwrap();

        let company_id = kontera_storage::find_company_by_org_number(&pool, "556123-4567")
            .await
            .unwrap()
            .unwrap()
            .id
            .unwrap();

        let second = import(&pool, &engine, &data, Some(company_id)).await.unwrap();

        assert!(first.company_created);
        assert!(!second.company_created);
        assert_eq!(second.accounts_imported, 0);
    }
}
