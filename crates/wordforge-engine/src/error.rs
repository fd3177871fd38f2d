//! Error types for the generation engine

use serde::{Deserialize, Serialize};
use thiserror::Error;
use wordforge_cache::CacheError;

/// Errors surfaced by the engine
///
/// `Clone` so that one failed single-flight computation can be reported to
/// every caller waiting on it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// The request was malformed; rejected before any generation work
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The result set grew past the configured memory ceiling
    #[error("Memory limit exceeded: {used_bytes} bytes tracked, limit {limit_bytes} bytes")]
    MemoryLimitExceeded { used_bytes: u64, limit_bytes: u64 },

    /// The caller's deadline passed before a result was available
    #[error("Generation timed out after {timeout_ms}ms")]
    GenerationTimeout { timeout_ms: u64 },

    /// The dictionary could not be reached
    #[error("Dictionary unavailable: {0}")]
    DictionaryUnavailable(String),

    /// Unrecoverable failure inside the engine
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Boundary code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::InvalidInput(_) => ErrorCode::InvalidInput,
            EngineError::MemoryLimitExceeded { .. } => ErrorCode::MemoryLimitExceeded,
            EngineError::GenerationTimeout { .. } => ErrorCode::GenerationTimeout,
            EngineError::DictionaryUnavailable(_) => ErrorCode::DictionaryUnavailable,
            EngineError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Whether the request may still succeed as a degraded result
    pub fn is_fatal(&self) -> bool {
        !matches!(self, EngineError::DictionaryUnavailable(_))
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

impl From<CacheError> for EngineError {
    fn from(err: CacheError) -> Self {
        EngineError::Internal(err.to_string())
    }
}

/// Error codes reported to the request boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidInput,
    MemoryLimitExceeded,
    GenerationTimeout,
    DictionaryUnavailable,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::MemoryLimitExceeded => "MEMORY_LIMIT_EXCEEDED",
            ErrorCode::GenerationTimeout => "GENERATION_TIMEOUT",
            ErrorCode::DictionaryUnavailable => "DICTIONARY_UNAVAILABLE",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{ code, message }` pair carried by responses and warnings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
