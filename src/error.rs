//! Error types for the LTI app collator.

use crate::types::RecordId;
use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Record not found: {kind} {id}")]
    RecordNotFound { kind: &'static str, id: RecordId },

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors surfaced by collation, pagination, and projection
#[derive(Debug, Error)]
pub enum CollatorError {
    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    #[error("Invalid bookmark: {0}")]
    InvalidBookmark(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    /// Failure reported by the injected reregistration URL builder
    #[error(transparent)]
    UrlBuilder(anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<config::ConfigError> for CollatorError {
    fn from(err: config::ConfigError) -> Self {
        CollatorError::ConfigError(err.to_string())
    }
}
