// Command handlers for the wordforge CLI

pub mod fingerprint;
pub mod generate;
pub mod score;

pub use fingerprint::FingerprintCommand;
pub use generate::{render_response, GenerateCommand};
pub use score::ScoreCommand;

use crate::error::CliResult;

/// Trait for command handlers
///
/// Handlers return their rendered output so the router decides where it goes.
#[async_trait::async_trait]
pub trait Command: Send + Sync {
    /// Execute the command
    async fn execute(&self) -> CliResult<String>;
}

/// Default `--max` when none is given: one slot per non-whitespace character
pub(crate) fn letter_count(letters: &str) -> i64 {
    letters.chars().filter(|c| !c.is_whitespace()).count() as i64
}
