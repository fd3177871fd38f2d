// Score words without generating anything

use super::Command;
use crate::error::{CliError, CliResult};
use wordforge_engine::ComplexityScorer;

/// Print each word with its complexity rating
pub struct ScoreCommand {
    words: Vec<String>,
    scorer: ComplexityScorer,
}

impl ScoreCommand {
    pub fn new(words: Vec<String>, saturation_length: usize) -> Self {
        Self {
            words,
            scorer: ComplexityScorer::new(saturation_length),
        }
    }
}

#[async_trait::async_trait]
impl Command for ScoreCommand {
    async fn execute(&self) -> CliResult<String> {
        if self.words.is_empty() {
            return Err(CliError::InvalidArgument {
                message: "at least one word is required".to_string(),
            });
        }

        let lines: Vec<String> = self
            .words
            .iter()
            .map(|word| format!("{}\t{}", word, self.scorer.score(word)))
            .collect();
        Ok(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scores_each_word_on_its_own_line() {
        let cmd = ScoreCommand::new(vec!["abcdef".to_string(), "aaa".to_string()], 15);
        let output = cmd.execute().await.unwrap();
        assert_eq!(output, "abcdef\t6\naaa\t1");
    }

    #[tokio::test]
    async fn test_no_words_is_an_argument_error() {
        let cmd = ScoreCommand::new(Vec::new(), 15);
        assert!(matches!(
            cmd.execute().await,
            Err(CliError::InvalidArgument { .. })
        ));
    }
}
