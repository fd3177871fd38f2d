//! Cache-related error types

use thiserror::Error;

/// Cache operation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Deserialization error: {message}")]
    Deserialization { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Invalid cache key: {key}")]
    InvalidKey { key: String },

    #[error("Computation for {key} failed to complete: {message}")]
    ComputationAborted { key: String, message: String },
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Re-export commonly used Result type
pub type Result<T> = std::result::Result<T, CacheError>;
