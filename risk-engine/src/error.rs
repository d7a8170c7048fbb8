//! Error types for risk engine

use thiserror::Error;

/// Risk engine error
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Calculation error
    #[error("Calculation error: {0}")]
    Calculation(String),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
