// Print the cache key a request would use

use super::Command;
use crate::error::CliResult;
use wordforge_config::GenerationSettings;
use wordforge_engine::{fingerprint, InputNormalizer, RawWordInput};

/// Normalize a request and print its fingerprint
pub struct FingerprintCommand {
    request: RawWordInput,
    settings: GenerationSettings,
}

impl FingerprintCommand {
    pub fn new(request: RawWordInput, settings: GenerationSettings) -> Self {
        Self { request, settings }
    }
}

#[async_trait::async_trait]
impl Command for FingerprintCommand {
    async fn execute(&self) -> CliResult<String> {
        let input = InputNormalizer::new(&self.settings).normalize(&self.request)?;
        Ok(fingerprint(&input, self.settings.mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use wordforge_engine::ErrorCode;

    #[tokio::test]
    async fn test_fingerprint_is_order_insensitive() {
        let settings = GenerationSettings::default();
        let a = FingerprintCommand::new(RawWordInput::new("listen", 3, 6), settings.clone());
        let b = FingerprintCommand::new(RawWordInput::new("SILENT", 3, 6), settings);

        let a = a.execute().await.unwrap();
        assert_eq!(a.len(), 64);
        assert_eq!(a, b.execute().await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_request_is_an_engine_error() {
        let cmd = FingerprintCommand::new(
            RawWordInput::new("abc", 1, 9),
            GenerationSettings::default(),
        );
        match cmd.execute().await {
            Err(CliError::Engine { code, .. }) => assert_eq!(code, ErrorCode::InvalidInput),
            other => panic!("unexpected {:?}", other),
        }
    }
}
