use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("store unavailable: {0}")]
    Store(#[from] sqlx::Error),
}
