//! Configuration manager implementation

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use tracing::debug;

use crate::{
    error::{ConfigError, Result},
    types::{ConfigManager as ConfigManagerTrait, EngineConfig},
};

const DEFAULT_ENV_PREFIX: &str = "WORDFORGE";
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration manager
pub struct ConfigManager {
    /// Configuration file path
    config_path: PathBuf,
    /// Environment prefix
    env_prefix: String,
}

impl ConfigManager {
    /// Create a new configuration manager
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        }
    }

    /// Create with custom config path
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            config_path: path,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        }
    }

    /// Override the environment variable prefix
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load and validate in one step
    pub fn load_validated(&mut self) -> Result<EngineConfig> {
        let config = self.load_config()?;
        self.validate_config(&config)?;
        Ok(config)
    }

    /// Get default config path
    fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wordforge")
            .join("config.toml")
    }
}

impl ConfigManagerTrait for ConfigManager {
    fn load_config(&mut self) -> Result<EngineConfig> {
        debug!(path = %self.config_path.display(), prefix = %self.env_prefix, "Loading engine configuration");

        let builder = Config::builder()
            .add_source(
                File::from(self.config_path.clone())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        let engine_config: EngineConfig = config.try_deserialize()?;
        Ok(engine_config)
    }

    fn save_config(&self, config: &EngineConfig) -> Result<()> {
        let toml = toml::to_string(config)?;
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.config_path, toml)?;
        Ok(())
    }

    fn validate_config(&self, config: &EngineConfig) -> Result<()> {
        let generation = &config.generation;
        if generation.max_combinations == 0 {
            return Err(ConfigError::Validation(
                "max_combinations must be greater than 0".to_string(),
            ));
        }
        if generation.memory_limit_bytes == 0 {
            return Err(ConfigError::Validation(
                "memory_limit_bytes must be greater than 0".to_string(),
            ));
        }
        if generation.max_candidates < generation.max_combinations {
            return Err(ConfigError::Validation(format!(
                "max_candidates ({}) must be at least max_combinations ({})",
                generation.max_candidates, generation.max_combinations
            )));
        }
        if generation.min_characters == 0 || generation.min_characters > generation.max_characters {
            return Err(ConfigError::Validation(format!(
                "character bounds must satisfy 1 <= min_characters <= max_characters (got {}..{})",
                generation.min_characters, generation.max_characters
            )));
        }
        if generation.alphabet.trim().is_empty() {
            return Err(ConfigError::Validation("alphabet must not be empty".to_string()));
        }
        if generation.saturation_length == 0 {
            return Err(ConfigError::Validation(
                "saturation_length must be greater than 0".to_string(),
            ));
        }

        let dictionary = &config.dictionary;
        if dictionary.batch_size == 0 {
            return Err(ConfigError::Validation(
                "dictionary batch_size must be greater than 0".to_string(),
            ));
        }
        if dictionary.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "dictionary timeout_ms must be greater than 0".to_string(),
            ));
        }
        if !(dictionary.accuracy_target > 0.0 && dictionary.accuracy_target <= 1.0) {
            return Err(ConfigError::Validation(format!(
                "accuracy_target must be in (0, 1], got {}",
                dictionary.accuracy_target
            )));
        }
        if dictionary.circuit_breaker.failure_threshold == 0
            || dictionary.circuit_breaker.success_threshold == 0
        {
            return Err(ConfigError::Validation(
                "circuit breaker thresholds must be greater than 0".to_string(),
            ));
        }

        if config.coordinator.request_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "request_timeout_ms must be greater than 0".to_string(),
            ));
        }

        let level = config.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "unknown log level: {}",
                config.logging.level
            )));
        }

        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
