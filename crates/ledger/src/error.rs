use chrono::NaiveDate;
use kontera_core::{AccountId, FiscalYearId, Money, VerificationId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("unbalanced verification: debit={0} credit={1}")]
    Balance(Money, Money),

    #[error("a verification needs at least two non-zero lines")]
    EmptyVerification,

    #[error("account {0} not found or not owned by this company")]
    Account(AccountId),

    #[error("date {date} is outside fiscal year {start}..{end}")]
    Period { date: NaiveDate, start: NaiveDate, end: NaiveDate },

    #[error("fiscal year {0:?} is closed")]
    ClosedYear(FiscalYearId),

    #[error("verification {0:?} not found")]
    VerificationNotFound(VerificationId),

    #[error("not found")]
    NotFound,

    #[error("store unavailable: {0}")]
    Store(#[from] sqlx::Error),
}
