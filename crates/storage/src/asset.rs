use chrono::NaiveDate;
use kontera_core::{AccountId, CompanyId, Money};

use crate::DbPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetType {
    Tangible,
    Intangible,
    Financial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepreciationMethod {
    Linear,
    Declining,
    Component,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetId(pub i64);

#[derive(Debug, Clone)]
pub struct Asset {
    pub id: Option<AssetId>,
    pub company_id: CompanyId,
    pub name: String,
    pub asset_type: AssetType,
    pub method: DepreciationMethod,
    pub acquisition_date: NaiveDate,
    pub acquisition_cost: Money,
    pub residual_value: Money,
    pub useful_life_months: i64,
    pub carrying_account_id: AccountId,
    pub expense_account_id: AccountId,
    pub accumulated_account_id: AccountId,
    pub is_active: bool,
    pub disposed_date: Option<NaiveDate>,
    pub disposal_proceeds: Option<Money>,
    pub disposal_gain_loss: Option<Money>,
}

fn asset_type_to_str(t: AssetType) -> &'static str {
    match t {
        AssetType::Tangible => "Tangible",
        AssetType::Intangible => "Intangible",
        AssetType::Financial => "Financial",
    }
}

fn asset_type_from_str(s: &str) -> AssetType {
    match s {
        "Intangible" => AssetType::Intangible,
        "Financial" => AssetType::Financial,
        _ => AssetType::Tangible,
    }
}

pub fn method_to_str(m: DepreciationMethod) -> &'static str {
    match m {
        DepreciationMethod::Linear => "Linear",
        DepreciationMethod::Declining => "Declining",
        DepreciationMethod::Component => "Component",
    }
}

pub fn method_from_str(s: &str) -> DepreciationMethod {
    match s {
        "Declining" => DepreciationMethod::Declining,
        "Component" => DepreciationMethod::Component,
        _ => DepreciationMethod::Linear,
    }
}

type AssetRow = (
    i64,
    i64,
    String,
    String,
    String,
    String,
    i64,
    i64,
    i64,
    i64,
    i64,
    i64,
    i64,
    Option<String>,
    Option<i64>,
    Option<i64>,
);

fn row_to_asset(row: AssetRow) -> Asset {
    Asset {
        id: Some(AssetId(row.0)),
        company_id: CompanyId(row.1),
        name: row.2,
        asset_type: asset_type_from_str(&row.3),
        method: method_from_str(&row.4),
        acquisition_date: NaiveDate::parse_from_str(&row.5, "%Y-%m-%d").expect("valid date"),
        acquisition_cost: Money::from_ore(row.6),
        residual_value: Money::from_ore(row.7),
        useful_life_months: row.8,
        carrying_account_id: AccountId(row.9),
        expense_account_id: AccountId(row.10),
        accumulated_account_id: AccountId(row.11),
        is_active: row.12 != 0,
        disposed_date: row
            .13
            .as_deref()
            .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")),
        disposal_proceeds: row.14.map(Money::from_ore),
        disposal_gain_loss: row.15.map(Money::from_ore),
    }
}

pub async fn insert_asset(pool: &DbPool, asset: &Asset) -> Result<AssetId, sqlx::Error> {
    let id = sqlx::query(
        r#"
        INSERT INTO assets (
            company_id, name, asset_type, method, acquisition_date, acquisition_cost_ore,
            residual_value_ore, useful_life_months, carrying_account_id, expense_account_id,
            accumulated_account_id, is_active
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(asset.company_id.0)
    .bind(&asset.name)
    .bind(asset_type_to_str(asset.asset_type))
    .bind(method_to_str(asset.method))
    .bind(asset.acquisition_date.format("%Y-%m-%d").to_string())
    .bind(asset.acquisition_cost.ore())
    .bind(asset.residual_value.ore())
    .bind(asset.useful_life_months)
    .bind(asset.carrying_account_id.0)
    .bind(asset.expense_account_id.0)
    .bind(asset.accumulated_account_id.0)
    .bind(asset.is_active as i64)
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(AssetId(id))
}

pub async fn get_asset(pool: &DbPool, id: AssetId) -> Result<Option<Asset>, sqlx::Error> {
    let row = sqlx::query_as::<_, AssetRow>(
        r#"
        SELECT id, company_id, name, asset_type, method, acquisition_date, acquisition_cost_ore,
               residual_value_ore, useful_life_months, carrying_account_id, expense_account_id,
               accumulated_account_id, is_active, disposed_date, disposal_proceeds_ore,
               disposal_gain_loss_ore
        FROM assets WHERE id = ?
        "#,
    )
    .bind(id.0)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(row_to_asset))
}

pub async fn list_assets(pool: &DbPool, company_id: CompanyId, active_only: bool) -> Result<Vec<Asset>, sqlx::Error> {
    let query = if active_only {
        "SELECT id, company_id, name, asset_type, method, acquisition_date, acquisition_cost_ore, residual_value_ore, useful_life_months, carrying_account_id, expense_account_id, accumulated_account_id, is_active, disposed_date, disposal_proceeds_ore, disposal_gain_loss_ore FROM assets WHERE company_id = ? AND is_active = 1"
    } else {
        "SELECT id, company_id, name, asset_type, method, acquisition_date, acquisition_cost_ore, residual_value_ore, useful_life_months, carrying_account_id, expense_account_id, accumulated_account_id, is_active, disposed_date, disposal_proceeds_ore, disposal_gain_loss_ore FROM assets WHERE company_id = ?"
    };

    let rows = sqlx::query_as::<_, AssetRow>(query)
        .bind(company_id.0)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(row_to_asset).collect())
}

/// Idempotent by (asset, period_date, period_type): `INSERT OR IGNORE`, so a
/// repeat call for an already-posted period is a no-op. Returns whether a new
/// row was inserted.
pub async fn insert_depreciation_entry(
    pool: &DbPool,
    asset_id: AssetId,
    period_date: NaiveDate,
    period_type: &str,
    amount: Money,
    verification_id: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO asset_depreciations (asset_id, period_date, period_type, amount_ore, verification_id) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(asset_id.0)
    .bind(period_date.format("%Y-%m-%d").to_string())
    .bind(period_type)
    .bind(amount.ore())
    .bind(verification_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn accumulated_depreciation(pool: &DbPool, asset_id: AssetId) -> Result<Money, sqlx::Error> {
    let total: Option<i64> =
        sqlx::query_scalar("SELECT SUM(amount_ore) FROM asset_depreciations WHERE asset_id = ?")
            .bind(asset_id.0)
            .fetch_one(pool)
            .await?;

    Ok(Money::from_ore(total.unwrap_or(0)))
}

pub async fn depreciated_period_dates(
    pool: &DbPool,
    asset_id: AssetId,
) -> Result<Vec<NaiveDate>, sqlx::Error> {
    let dates: Vec<String> =
        sqlx::query_scalar("SELECT period_date FROM asset_depreciations WHERE asset_id = ? ORDER BY period_date")
            .bind(asset_id.0)
            .fetch_all(pool)
            .await?;

    Ok(dates
        .into_iter()
        .map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").expect("valid date"))
        .collect())
}

pub async fn mark_asset_disposed(
    pool: &DbPool,
    id: AssetId,
    disposed_date: NaiveDate,
    proceeds: Money,
    gain_loss: Money,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE assets SET is_active = 0, disposed_date = ?, disposal_proceeds_ore = ?, disposal_gain_loss_ore = ? WHERE id = ?",
    )
    .bind(disposed_date.format("%Y-%m-%d").to_string())
    .bind(proceeds.ore())
    .bind(gain_loss.ore())
    .bind(id.0)
    .execute(pool)
    .await?;
    Ok(())
}
