//! wordforge configuration management
//!
//! Typed configuration for the generation engine. Configuration is layered from
//! built-in defaults, an optional TOML file and `WORDFORGE__*` environment
//! variables, then validated before the engine is assembled.

pub mod error;
pub mod manager;
pub mod types;

pub use error::{ConfigError, Result};
pub use manager::ConfigManager;
pub use types::{
    CacheSettings, CircuitBreakerSettings, ConfigManager as ConfigManagerTrait,
    CoordinatorSettings, DictionarySettings, EngineConfig, GenerationMode, GenerationSettings,
    LoggingSettings,
};
