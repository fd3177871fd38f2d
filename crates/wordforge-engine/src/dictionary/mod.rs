//! Dictionary collaborator port and the validator built on it

pub mod circuit_breaker;
pub mod validator;
pub mod word_list;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use validator::{AccuracyReport, BatchValidation, DictionaryValidator, ValidationResult};
pub use word_list::WordListDictionary;

/// Errors a dictionary lookup can fail with
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DictionaryError {
    #[error("Dictionary source unavailable: {0}")]
    Unavailable(String),

    #[error("Dictionary lookup timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Circuit open for dictionary source {source_name}")]
    CircuitOpen { source_name: String },

    #[error("Failed to read word list: {0}")]
    Io(String),
}

impl From<std::io::Error> for DictionaryError {
    fn from(err: std::io::Error) -> Self {
        DictionaryError::Io(err.to_string())
    }
}

/// One word's answer from a dictionary source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryEntry {
    pub word: String,
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
}

impl DictionaryEntry {
    pub fn valid(word: impl Into<String>, definition: Option<String>) -> Self {
        Self {
            word: word.into(),
            is_valid: true,
            definition,
        }
    }

    pub fn invalid(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            is_valid: false,
            definition: None,
        }
    }
}

/// External word lookup service
///
/// Implementations answer a whole batch in one call. Words left out of the reply
/// are treated as not found.
#[async_trait]
pub trait DictionarySource: Send + Sync {
    /// Name used in logs and circuit breaker messages
    fn name(&self) -> &str;

    async fn lookup(
        &self,
        words: &[String],
        language: &str,
    ) -> Result<Vec<DictionaryEntry>, DictionaryError>;
}
