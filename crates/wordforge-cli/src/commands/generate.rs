// Run a generation request end to end

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use serde_json::Value;
use tracing::info;

use super::Command;
use crate::error::{CliError, CliResult};
use wordforge_engine::{
    DictionarySource, EngineConfig, GenerationCoordinator, RawWordInput, WordGenerationResponse,
    WordListDictionary,
};

/// Generate, validate and print candidate words
pub struct GenerateCommand {
    request: RawWordInput,
    config: EngineConfig,
    dictionary: Option<PathBuf>,
    limit: Option<usize>,
}

impl GenerateCommand {
    pub fn new(request: RawWordInput, config: EngineConfig) -> Self {
        Self {
            request,
            config,
            dictionary: None,
            limit: None,
        }
    }

    /// Word list to validate against; without one every candidate is reported invalid
    pub fn with_dictionary(mut self, path: Option<PathBuf>) -> Self {
        self.dictionary = path;
        self
    }

    /// Show at most `limit` combinations
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    fn language(&self) -> String {
        self.request
            .language
            .as_deref()
            .unwrap_or(wordforge_engine::normalizer::DEFAULT_LANGUAGE)
            .trim()
            .to_lowercase()
            .replace('_', "-")
    }

    fn load_dictionary(&self) -> anyhow::Result<Arc<dyn DictionarySource>> {
        let Some(path) = &self.dictionary else {
            return Ok(Arc::new(WordListDictionary::new("empty")));
        };

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "word-list".to_string());
        let language = self.language();
        let dictionary = WordListDictionary::from_file(name, &language, path)
            .with_context(|| format!("Failed to load word list {}", path.display()))?;
        info!(
            path = %path.display(),
            language = %language,
            words = dictionary.len(&language),
            "Loaded word list"
        );
        Ok(Arc::new(dictionary))
    }
}

/// Pretty JSON for a response, keeping only the first `limit` combinations
pub fn render_response(
    response: &WordGenerationResponse,
    limit: Option<usize>,
) -> Result<String, serde_json::Error> {
    let mut value = serde_json::to_value(response)?;
    if let Some(limit) = limit {
        if let Some(list) = value
            .pointer_mut("/data/combinations")
            .and_then(Value::as_array_mut)
        {
            list.truncate(limit);
        }
    }
    serde_json::to_string_pretty(&value)
}

#[async_trait::async_trait]
impl Command for GenerateCommand {
    async fn execute(&self) -> CliResult<String> {
        let dictionary = self.load_dictionary()?;
        let coordinator = GenerationCoordinator::new(self.config.clone(), dictionary);
        let response = coordinator.generate(&self.request).await;
        let rendered = render_response(&response, self.limit)?;

        match (&response.success, &response.error) {
            (false, Some(body)) => Err(CliError::Engine {
                code: body.code,
                message: body.message.clone(),
            }
            .with_output(rendered)),
            _ => Ok(rendered),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use wordforge_engine::ErrorCode;

    fn word_list(words: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for word in words {
            writeln!(file, "{}", word).unwrap();
        }
        file
    }

    #[tokio::test]
    async fn test_generate_with_dictionary() {
        let file = word_list(&["stone", "notes", "tones"]);
        let cmd = GenerateCommand::new(RawWordInput::new("stone", 5, 5), EngineConfig::default())
            .with_dictionary(Some(file.path().to_path_buf()));

        let output = cmd.execute().await.unwrap();
        let json: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["combinations"].as_array().unwrap().len(), 120);
        assert_eq!(json["data"]["statistics"]["validWords"], 3);
    }

    #[tokio::test]
    async fn test_limit_trims_listing_only() {
        let cmd = GenerateCommand::new(RawWordInput::new("abcd", 2, 3), EngineConfig::default())
            .with_limit(Some(5));

        let output = cmd.execute().await.unwrap();
        let json: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["data"]["combinations"].as_array().unwrap().len(), 5);
        assert_eq!(json["data"]["totalGenerated"], 36);
    }

    #[tokio::test]
    async fn test_missing_word_list_is_a_setup_error() {
        let cmd = GenerateCommand::new(RawWordInput::new("abc", 2, 3), EngineConfig::default())
            .with_dictionary(Some(PathBuf::from("/nonexistent/words.txt")));

        match cmd.execute().await {
            Err(CliError::Setup(err)) => assert!(format!("{:#}", err).contains("words.txt")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fatal_engine_error_keeps_rendered_response() {
        let cmd = GenerateCommand::new(RawWordInput::new("ab1", 2, 3), EngineConfig::default());

        match cmd.execute().await {
            Err(CliError::Rendered { output, source }) => {
                let json: Value = serde_json::from_str(&output).unwrap();
                assert_eq!(json["success"], false);
                assert_eq!(json["error"]["code"], "INVALID_INPUT");
                assert!(matches!(
                    *source,
                    CliError::Engine { code: ErrorCode::InvalidInput, .. }
                ));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
