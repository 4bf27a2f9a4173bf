pub mod accrual;
pub mod depreciation;
pub mod error;
pub mod template;

pub use accrual::{
    default_source_account, generate_entry, get_pending_entries, period_date, run_accrual,
    run_auto_accruals, AccrualRunStats, PendingEntry,
};
pub use depreciation::{
    calculate_depreciation, create_depreciation_entry, default_accounts, dispose_asset,
    run_period_depreciation, DepreciationRunStats, Disposal,
};
pub use error::RuleError;
pub use template::{apply_template, initialize_standard_templates, SeedStats};
