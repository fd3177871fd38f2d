//! Core configuration types and data structures

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

/// Main engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Candidate enumeration budgets and input rules
    pub generation: GenerationSettings,
    /// Dictionary collaborator settings
    pub dictionary: DictionarySettings,
    /// Result cache settings
    pub cache: CacheSettings,
    /// Request orchestration settings
    pub coordinator: CoordinatorSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// How candidates are drawn from the input letters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// Every ordering of every sub-multiset of the letters
    #[default]
    Permutations,
    /// Sub-multisets only, letters kept in sorted order
    Subsequences,
}

impl GenerationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::Permutations => "permutations",
            GenerationMode::Subsequences => "subsequences",
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permutations" | "permutation" | "perm" => Ok(GenerationMode::Permutations),
            "subsequences" | "subsequence" | "combinations" => Ok(GenerationMode::Subsequences),
            other => Err(format!("unknown generation mode: {}", other)),
        }
    }
}

/// Generation budgets and input normalization rules
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationSettings {
    /// Enumeration mode
    pub mode: GenerationMode,
    /// Hard cap on retained combinations per request
    pub max_combinations: usize,
    /// Ceiling on the tracked size of the result set
    pub memory_limit_bytes: u64,
    /// Enumeration nodes a request may visit, retained or not
    pub max_candidates: usize,
    /// Fewest letters accepted after normalization
    pub min_characters: usize,
    /// Most letters accepted at the request boundary
    pub max_characters: usize,
    /// Letters kept by normalization (upper case)
    pub alphabet: String,
    /// Reject input containing characters outside the alphabet instead of stripping them
    pub strict: bool,
    /// Word length at which the complexity length score saturates
    pub saturation_length: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            mode: GenerationMode::Permutations,
            max_combinations: 100_000,
            memory_limit_bytes: 8 * 1024 * 1024,
            max_candidates: 1_000_000,
            min_characters: 2,
            max_characters: 15,
            alphabet: "ABCDEFGHIJKLMNOPQRSTUVWXYZ".to_string(),
            strict: true,
            saturation_length: 15,
        }
    }
}

/// Dictionary collaborator configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DictionarySettings {
    /// Words sent per lookup call
    pub batch_size: usize,
    /// Deadline for a single lookup call
    pub timeout_ms: u64,
    /// Minimum fraction of correctly classified words
    pub accuracy_target: f64,
    /// Circuit breaker around the lookup call
    pub circuit_breaker: CircuitBreakerSettings,
}

impl DictionarySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for DictionarySettings {
    fn default() -> Self {
        Self {
            batch_size: 1_000,
            timeout_ms: 2_000,
            accuracy_target: 0.95,
            circuit_breaker: CircuitBreakerSettings::default(),
        }
    }
}

/// Circuit breaker thresholds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    /// Failures before the circuit opens
    pub failure_threshold: u32,
    /// Time the circuit stays open before probing
    pub recovery_timeout_ms: u64,
    /// Successful probes needed to close again
    pub success_threshold: u32,
    /// Failures older than this no longer count
    pub failure_window_ms: u64,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout_ms: 30_000,
            success_threshold: 3,
            failure_window_ms: 60_000,
        }
    }
}

/// Result cache configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheSettings {
    /// Lifetime of a cached generation result
    pub ttl_secs: u64,
    /// Enable metrics collection
    pub enable_metrics: bool,
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: 60,
            enable_metrics: true,
        }
    }
}

/// Request orchestration configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CoordinatorSettings {
    /// Per-request deadline
    pub request_timeout_ms: u64,
}

impl CoordinatorSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            request_timeout_ms: 5_000,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    /// Maximum level: trace, debug, info, warn or error
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration manager trait
pub trait ConfigManager {
    /// Load configuration
    fn load_config(&mut self) -> Result<EngineConfig, crate::error::ConfigError>;
    /// Save configuration
    fn save_config(&self, config: &EngineConfig) -> Result<(), crate::error::ConfigError>;
    /// Validate configuration
    fn validate_config(&self, config: &EngineConfig) -> Result<(), crate::error::ConfigError>;
}
