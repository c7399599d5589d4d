// src/error.rs

use thiserror::Error;

/// Failures a store operation can surface. Everything except `Validation`
/// is a persistence failure: the write or read did not happen and callers
/// must not assume partial success. Not-found is not an error; lookups
/// return `Ok(None)`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("local store error: {0}")]
    Local(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("malformed stored record: {0}")]
    Malformed(String),
}

impl StoreError {
    pub fn is_persistence(&self) -> bool {
        !matches!(self, StoreError::Validation(_))
    }
}
