use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("asset not found")]
    AssetNotFound,

    #[error("accrual not found")]
    AccrualNotFound,

    #[error("template not found")]
    TemplateNotFound,

    #[error("template {0:?} has no remainder line and does not balance")]
    TemplateUnbalanced(kontera_storage::TemplateId),

    #[error("template definition invalid: {0}")]
    TemplateInvalid(#[from] kontera_storage::TemplateError),

    #[error("store unavailable: {0}")]
    Store(#[from] sqlx::Error),

    #[error("ledger rejected a generated verification: {0}")]
    Ledger(#[from] kontera_ledger::LedgerError),
}
