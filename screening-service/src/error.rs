use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScreeningError {
    #[error("Invalid screening input: {0}")]
    Validation(String),

    #[error("Watchlist data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Scoring degraded: {0}")]
    ScoringDegraded(String),

    #[error("Audit write failed: {0}")]
    AuditWrite(String),

    #[error("Watchlist feed failed: {0}")]
    Feed(String),

    #[error("Invalid media article: {0}")]
    InvalidArticle(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Audit log error: {0}")]
    Audit(#[from] audit_ledger::Error),

    #[error("Risk engine error: {0}")]
    Risk(#[from] risk_engine::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScreeningError>;
