use crate::DbPool;

pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS companies (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            org_number TEXT NOT NULL UNIQUE,
            accounting_standard TEXT NOT NULL,
            fiscal_year_start_month INTEGER NOT NULL DEFAULT 1,
            contact_email TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            company_id INTEGER NOT NULL REFERENCES companies(id),
            number TEXT NOT NULL,
            name TEXT NOT NULL,
            account_type TEXT NOT NULL,
            vat_code TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            opening_balance_ore INTEGER NOT NULL DEFAULT 0,
            UNIQUE(company_id, number)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS fiscal_years (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            company_id INTEGER NOT NULL REFERENCES companies(id),
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            is_closed INTEGER NOT NULL DEFAULT 0,
            UNIQUE(company_id, start_date, end_date)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS verifications (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            company_id INTEGER NOT NULL REFERENCES companies(id),
            fiscal_year_id INTEGER NOT NULL REFERENCES fiscal_years(id),
            number INTEGER NOT NULL,
            transaction_date TEXT NOT NULL,
            description TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(company_id, fiscal_year_id, number)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS verification_lines (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            verification_id INTEGER NOT NULL REFERENCES verifications(id) ON DELETE CASCADE,
            account_id INTEGER NOT NULL REFERENCES accounts(id),
            debit_ore INTEGER NOT NULL DEFAULT 0,
            credit_ore INTEGER NOT NULL DEFAULT 0,
            note TEXT,
            line_order INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS assets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            company_id INTEGER NOT NULL REFERENCES companies(id),
            name TEXT NOT NULL,
            asset_type TEXT NOT NULL,
            method TEXT NOT NULL,
            acquisition_date TEXT NOT NULL,
            acquisition_cost_ore INTEGER NOT NULL,
            residual_value_ore INTEGER NOT NULL DEFAULT 0,
            useful_life_months INTEGER NOT NULL,
            carrying_account_id INTEGER NOT NULL REFERENCES accounts(id),
            expense_account_id INTEGER NOT NULL REFERENCES accounts(id),
            accumulated_account_id INTEGER NOT NULL REFERENCES accounts(id),
            is_active INTEGER NOT NULL DEFAULT 1,
            disposed_date TEXT,
            disposal_proceeds_ore INTEGER,
            disposal_gain_loss_ore INTEGER
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS asset_depreciations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            asset_id INTEGER NOT NULL REFERENCES assets(id),
            period_date TEXT NOT NULL,
            period_type TEXT NOT NULL,
            amount_ore INTEGER NOT NULL,
            verification_id INTEGER REFERENCES verifications(id),
            UNIQUE(asset_id, period_date, period_type)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS accruals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            company_id INTEGER NOT NULL REFERENCES companies(id),
            fiscal_year_id INTEGER NOT NULL REFERENCES fiscal_years(id),
            name TEXT NOT NULL,
            description TEXT,
            accrual_type TEXT NOT NULL,
            total_amount_ore INTEGER NOT NULL,
            periods INTEGER NOT NULL,
            amount_per_period_ore INTEGER NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            frequency TEXT NOT NULL,
            source_account_id INTEGER NOT NULL REFERENCES accounts(id),
            target_account_id INTEGER NOT NULL REFERENCES accounts(id),
            is_active INTEGER NOT NULL DEFAULT 1,
            auto_generate INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS accrual_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            accrual_id INTEGER NOT NULL REFERENCES accruals(id),
            period_number INTEGER NOT NULL,
            period_date TEXT NOT NULL,
            amount_ore INTEGER NOT NULL,
            verification_id INTEGER REFERENCES verifications(id),
            UNIQUE(accrual_id, period_number)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS templates (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            company_id INTEGER NOT NULL REFERENCES companies(id),
            name TEXT NOT NULL,
            description TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS template_lines (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            template_id INTEGER NOT NULL REFERENCES templates(id) ON DELETE CASCADE,
            account_id INTEGER NOT NULL REFERENCES accounts(id),
            side TEXT NOT NULL,
            line_kind TEXT NOT NULL,
            fixed_amount_ore INTEGER,
            percentage_rate TEXT,
            line_order INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
