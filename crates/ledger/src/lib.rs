pub mod balance;
pub mod closing;
pub mod error;
pub mod posting;

pub use balance::{account_balance, period_result, trial_balance, TrialBalanceRow};
pub use closing::{close_fiscal_year, create_opening_balances, disposition, validate, ClosingValidation};
pub use error::LedgerError;
pub use posting::PostingEngine;
