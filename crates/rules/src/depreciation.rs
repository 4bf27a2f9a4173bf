use chrono::NaiveDate;
use kontera_core::{AccountId, CompanyId, FiscalYearId, Money, VerificationLine};
use kontera_ledger::PostingEngine;
use kontera_storage::{Asset, AssetId, AssetType, DbPool, DepreciationMethod};

use crate::error::RuleError;

/// Suggested BAS accounts (carrying, depreciation expense, accumulated
/// depreciation) for an asset class, used to prefill new assets. Callers are
/// free to point an asset at different accounts.
pub fn default_accounts(asset_type: AssetType) -> (&'static str, &'static str, Option<&'static str>) {
    match asset_type {
        AssetType::Tangible => ("1220", "7832", Some("1229")),
        AssetType::Intangible => ("1010", "7810", Some("1019")),
        AssetType::Financial => ("1310", "8170", None),
    }
}

/// The period amount for one run of an asset's schedule: the straight-line
/// monthly share, clamped so depreciation never carries the book value below
/// the residual value. Only [`DepreciationMethod::Linear`] is scheduled;
/// `Declining`/`Component` assets are recognized but never produce a run.
pub async fn calculate_depreciation(
    pool: &DbPool,
    asset: &Asset,
) -> Result<Money, RuleError> {
    if asset.method != DepreciationMethod::Linear || asset.useful_life_months <= 0 {
        return Ok(Money::zero());
    }

    let total_depreciable = asset.acquisition_cost - asset.residual_value;
    if total_depreciable.is_negative() || total_depreciable.is_zero() {
        return Ok(Money::zero());
    }

    let monthly = Money::from_ore(total_depreciable.ore() / asset.useful_life_months);

    let accumulated = kontera_storage::accumulated_depreciation(pool, asset.id.ok_or(RuleError::AssetNotFound)?).await?;
    let book_value = asset.acquisition_cost - accumulated;
    let remaining = book_value - asset.residual_value;

    if remaining.is_negative() || remaining.is_zero() {
        return Ok(Money::zero());
    }

    Ok(if monthly.ore() > remaining.ore() { remaining } else { monthly })
}

/// Posts one period's depreciation for a single asset and records it in
/// `asset_depreciations`. Idempotent: a period already booked for this asset
/// is a no-op (returns `Ok(None)`).
pub async fn create_depreciation_entry(
    pool: &DbPool,
    engine: &PostingEngine,
    company_id: CompanyId,
    fiscal_year_id: FiscalYearId,
    asset: &Asset,
    period_date: NaiveDate,
) -> Result<Option<Money>, RuleError> {
    let asset_id = asset.id.ok_or(RuleError::AssetNotFound)?;

    let already_booked = kontera_storage::depreciated_period_dates(pool, asset_id)
        .await?
        .contains(&period_date);
    if already_booked {
        return Ok(None);
    }

    let amount = calculate_depreciation(pool, asset).await?;
    if amount.is_zero() {
        return Ok(None);
    }

    let lines = vec![
        VerificationLine::debit(asset.expense_account_id, amount),
        VerificationLine::credit(asset.accumulated_account_id, amount),
    ];
    let description = format!("Avskrivning {}", asset.name);
    let verification = engine
        .create_verification(company_id, fiscal_year_id, period_date, &description, lines)
        .await?;

    kontera_storage::insert_depreciation_entry(
        pool,
        asset_id,
        period_date,
        "monthly",
        amount,
        verification.id.map(|id| id.0),
    )
    .await?;

    Ok(Some(amount))
}

#[derive(Debug, Default, Clone)]
pub struct DepreciationRunStats {
    pub posted: usize,
    pub skipped: usize,
}

/// Runs depreciation for every active asset of a company whose acquisition
/// date is on or before `period_date`. An asset that errors (e.g. an account
/// no longer owned by the company) is logged and skipped; the run continues.
pub async fn run_period_depreciation(
    pool: &DbPool,
    engine: &PostingEngine,
    company_id: CompanyId,
    fiscal_year_id: FiscalYearId,
    period_date: NaiveDate,
) -> Result<DepreciationRunStats, RuleError> {
    let mut stats = DepreciationRunStats::default();

    for asset in kontera_storage::list_assets(pool, company_id, true).await? {
        if asset.acquisition_date > period_date {
            continue;
        }

        match create_depreciation_entry(pool, engine, company_id, fiscal_year_id, &asset, period_date).await {
            Ok(Some(_)) => stats.posted += 1,
            Ok(None) => {}
            Err(err) => {
                stats.skipped += 1;
                tracing::warn!(asset = %asset.name, error = %err, "skipping asset in depreciation run");
            }
        }
    }

    Ok(stats)
}

pub struct Disposal {
    pub book_value: Money,
    pub gain_loss: Money,
}

/// Computes the carrying value and gain/loss on disposal and marks the asset
/// inactive. Does not post a verification: realizing the disposal (writing
/// off the carrying amount, booking any cash proceeds) is a caller
/// responsibility, since the correct accounts depend on how the asset was
/// disposed of.
pub async fn dispose_asset(
    pool: &DbPool,
    asset_id: AssetId,
    disposed_date: NaiveDate,
    proceeds: Money,
) -> Result<Disposal, RuleError> {
    let asset = kontera_storage::get_asset(pool, asset_id).await?.ok_or(RuleError::AssetNotFound)?;
    let accumulated = kontera_storage::accumulated_depreciation(pool, asset_id).await?;
    let book_value = asset.acquisition_cost - accumulated;
    let gain_loss = proceeds - book_value;

    kontera_storage::mark_asset_disposed(pool, asset_id, disposed_date, proceeds, gain_loss).await?;

    Ok(Disposal { book_value, gain_loss })
}
