use kontera_core::{Account, AccountId, AccountType, ChartOfAccountsSeed, CompanyId, Money};

use crate::DbPool;

pub fn parse_chart_of_accounts_seed(json: &str) -> Result<ChartOfAccountsSeed, serde_json::Error> {
    serde_json::from_str(json)
}

fn type_to_str(t: AccountType) -> &'static str {
    match t {
        AccountType::Asset => "Asset",
        AccountType::Liability => "Liability",
        AccountType::Equity => "Equity",
        AccountType::Revenue => "Revenue",
        AccountType::Expense => "Expense",
    }
}

fn type_from_str(s: &str) -> AccountType {
    match s {
        "Liability" => AccountType::Liability,
        "Equity" => AccountType::Equity,
        "Revenue" => AccountType::Revenue,
        "Expense" => AccountType::Expense,
        _ => AccountType::Asset,
    }
}

type AccountRow = (i64, i64, String, String, String, Option<String>, i64, i64);

fn row_to_account(row: AccountRow) -> Account {
    Account {
        id: Some(AccountId(row.0)),
        company_id: CompanyId(row.1),
        number: row.2,
        name: row.3,
        account_type: type_from_str(&row.4),
        vat_code: row.5,
        is_active: row.6 != 0,
        opening_balance: Money::from_ore(row.7),
    }
}

pub async fn insert_account(pool: &DbPool, account: &Account) -> Result<AccountId, sqlx::Error> {
    let id = sqlx::query(
        "INSERT INTO accounts (company_id, number, name, account_type, vat_code, is_active, opening_balance_ore) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(account.company_id.0)
    .bind(&account.number)
    .bind(&account.name)
    .bind(type_to_str(account.account_type))
    .bind(&account.vat_code)
    .bind(account.is_active as i64)
    .bind(account.opening_balance.ore())
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(AccountId(id))
}

pub async fn get_account(pool: &DbPool, id: AccountId) -> Result<Option<Account>, sqlx::Error> {
    let row = sqlx::query_as::<_, AccountRow>(
        "SELECT id, company_id, number, name, account_type, vat_code, is_active, opening_balance_ore FROM accounts WHERE id = ?",
    )
    .bind(id.0)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(row_to_account))
}

pub async fn get_account_by_number(
    pool: &DbPool,
    company_id: CompanyId,
    number: &str,
) -> Result<Option<Account>, sqlx::Error> {
    let row = sqlx::query_as::<_, AccountRow>(
        "SELECT id, company_id, number, name, account_type, vat_code, is_active, opening_balance_ore FROM accounts WHERE company_id = ? AND number = ?",
    )
    .bind(company_id.0)
    .bind(number)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(row_to_account))
}

pub async fn list_accounts(pool: &DbPool, company_id: CompanyId) -> Result<Vec<Account>, sqlx::Error> {
    let rows = sqlx::query_as::<_, AccountRow>(
        "SELECT id, company_id, number, name, account_type, vat_code, is_active, opening_balance_ore FROM accounts WHERE company_id = ? ORDER BY number",
    )
    .bind(company_id.0)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(row_to_account).collect())
}

pub async fn set_account_opening_balance(
    pool: &DbPool,
    id: AccountId,
    balance: Money,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE accounts SET opening_balance_ore = ? WHERE id = ?")
        .bind(balance.ore())
        .bind(id.0)
        .execute(pool)
        .await?;
    Ok(())
}

/// Loads the JSON chart-of-accounts seed file (§6) and inserts every account
/// not already present for the company. Duplicates (company, number) are
/// skipped without overwriting the existing name — mirrors the SIE importer's
/// duplicate-account policy.
pub async fn seed_chart_of_accounts(
    pool: &DbPool,
    company_id: CompanyId,
    seed: &ChartOfAccountsSeed,
) -> Result<usize, sqlx::Error> {
    let mut inserted = 0;
    for entry in &seed.accounts {
        if get_account_by_number(pool, company_id, &entry.number).await?.is_some() {
            continue;
        }
        let account_type = AccountType::from_swedish(&entry.account_type)
            .unwrap_or_else(|| AccountType::infer_from_number(&entry.number));
        let mut account = Account::new(company_id, &entry.number, &entry.name, account_type);
        account.vat_code = entry.vat_code.clone();
        insert_account(pool, &account).await?;
        inserted += 1;
    }
    Ok(inserted)
}
