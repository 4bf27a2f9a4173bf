use thiserror::Error;

#[derive(Debug, Error)]
pub enum SieError {
    #[error("company could not be created or found for this import")]
    NoCompany,

    #[error("line {line}: malformed #{tag}")]
    Parse { line: usize, tag: String },

    #[error("store unavailable: {0}")]
    Store(#[from] sqlx::Error),

    #[error("ledger rejected a generated verification: {0}")]
    Ledger(#[from] kontera_ledger::LedgerError),
}
