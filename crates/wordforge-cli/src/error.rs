// CLI error types

use thiserror::Error;
use wordforge_engine::{EngineError, ErrorCode};

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Setup failed: {0:#}")]
    Setup(#[from] anyhow::Error),

    #[error("{code}: {message}")]
    Engine { code: ErrorCode, message: String },

    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),

    /// A failure whose response was already rendered and still belongs on stdout
    #[error("{source}")]
    Rendered { output: String, source: Box<CliError> },
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        CliError::Engine {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

impl From<wordforge_config::ConfigError> for CliError {
    fn from(err: wordforge_config::ConfigError) -> Self {
        CliError::Config(err.to_string())
    }
}

impl CliError {
    /// Attach rendered command output to this error
    pub fn with_output(self, output: String) -> Self {
        CliError::Rendered {
            output,
            source: Box::new(self),
        }
    }

    /// Output to print before reporting the error, if any
    pub fn output(&self) -> Option<&str> {
        match self {
            CliError::Rendered { output, .. } => Some(output),
            _ => None,
        }
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            CliError::InvalidArgument { message } => {
                format!("Invalid argument: {}\n\nRun 'wordforge --help' for usage information.", message)
            }
            CliError::Config(msg) => {
                format!(
                    "Configuration error: {}\n\nCheck the file passed with --config or the WORDFORGE__* environment.",
                    msg
                )
            }
            CliError::Setup(err) => format!("Setup failed: {:#}", err),
            CliError::Engine { code, message } => match code {
                ErrorCode::InvalidInput => {
                    format!("{}\n\nLetters must be A-Z and lengths must fit the letter count.", message)
                }
                ErrorCode::MemoryLimitExceeded => {
                    format!("{}\n\nTry a narrower --min/--max range.", message)
                }
                ErrorCode::GenerationTimeout => {
                    format!("{}\n\nRaise coordinator.request_timeout_ms or shrink the request.", message)
                }
                _ => message.clone(),
            },
            CliError::Output(err) => format!("Failed to render output: {}", err),
            CliError::Rendered { source, .. } => source.user_message(),
        }
    }

    /// Get technical details for verbose mode
    pub fn technical_details(&self) -> String {
        format!("{:?}", self)
    }
}

pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_keeps_code() {
        let err = CliError::from(EngineError::InvalidInput("bad letters".to_string()));
        match &err {
            CliError::Engine { code, .. } => assert_eq!(*code, ErrorCode::InvalidInput),
            other => panic!("unexpected {:?}", other),
        }
        assert!(err.user_message().contains("bad letters"));
        assert!(err.to_string().starts_with("INVALID_INPUT"));
    }

    #[test]
    fn test_rendered_error_delegates_message() {
        let inner = CliError::Engine {
            code: ErrorCode::GenerationTimeout,
            message: "Generation timed out after 50ms".to_string(),
        };
        let expected = inner.user_message();
        let err = inner.with_output("{}".to_string());
        assert_eq!(err.output(), Some("{}"));
        assert_eq!(err.user_message(), expected);
    }

    #[test]
    fn test_setup_error_shows_context_chain() {
        let err = CliError::from(
            anyhow::anyhow!("No such file").context("Failed to load word list words.txt"),
        );
        let message = err.user_message();
        assert!(message.contains("words.txt"));
        assert!(message.contains("No such file"));
    }
}
