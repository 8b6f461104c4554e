//! Top-level error types.
//!
//! Aggregates module errors into the single enum `main` reports at startup.

use thiserror::Error;

use crate::config::ConfigError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The inventory cannot be reached. Fatal only at startup.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// Reserved: the current generators cannot fail.
    #[error("Key generation failed: {0}")]
    GenerationFault(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
