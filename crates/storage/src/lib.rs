pub mod account;
pub mod accrual;
pub mod asset;
pub mod company;
pub mod fiscal_year;
pub mod schema;
pub mod template;
pub mod verification;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::path::Path;

pub type DbPool = Pool<Sqlite>;

pub async fn create_db(path: &Path) -> Result<DbPool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&format!("sqlite:{}?mode=rwc", path.display()))
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;
    sqlx::query("PRAGMA synchronous = NORMAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;
    sqlx::query("PRAGMA cache_size = -32000").execute(&pool).await?;

    schema::run_migrations(&pool).await?;

    Ok(pool)
}

pub use account::{
    get_account, get_account_by_number, insert_account, list_accounts,
    parse_chart_of_accounts_seed, seed_chart_of_accounts, set_account_opening_balance,
};
pub use accrual::{
    accrual_type_from_str, accrual_type_to_str, booked_amount_total, booked_period_numbers,
    deactivate_accrual, frequency_from_str, frequency_to_str, get_accrual, insert_accrual,
    insert_accrual_entry, list_accruals, Accrual, AccrualFrequency, AccrualId, AccrualType,
};
pub use asset::{
    accumulated_depreciation, depreciated_period_dates, get_asset, insert_asset,
    insert_depreciation_entry, list_assets, mark_asset_disposed, method_from_str, method_to_str,
    Asset, AssetId, AssetType, DepreciationMethod,
};
pub use company::{find_company_by_org_number, get_company, insert_company};
pub use fiscal_year::{find_fiscal_year_by_range, get_fiscal_year, insert_fiscal_year, set_fiscal_year_closed};
pub use template::{
    get_template, insert_template, list_templates, LineKind, Side, Template, TemplateError,
    TemplateId, TemplateLine,
};
pub use verification::{
    add_line, delete_line, delete_verification, get_verification, insert_verification,
    line_sums_for_account, list_verifications, next_verification_number, period_sums_for_prefix,
    update_verification_header,
};
