//! # wordforge engine
//!
//! Turns a bag of letters into scored, dictionary-checked candidate words.
//!
//! - [`InputNormalizer`] validates and canonicalizes requests
//! - [`ComplexityScorer`] rates a word from 1 to 10
//! - [`CombinationGenerator`] enumerates candidates under count and memory budgets
//! - [`DictionaryValidator`] checks candidates against a [`DictionarySource`],
//!   behind a circuit breaker
//! - [`GenerationCoordinator`] runs the pipeline behind a fingerprint-keyed,
//!   single-flight result cache
//!
//! ```ignore
//! let dictionary = WordListDictionary::from_file("words", "en", "words.txt")?;
//! let coordinator = GenerationCoordinator::new(EngineConfig::default(), Arc::new(dictionary));
//! let response = coordinator.generate(&RawWordInput::new("listen", 3, 6)).await;
//! ```

pub mod coordinator;
pub mod dictionary;
pub mod error;
pub mod fingerprint;
pub mod generator;
pub mod metrics;
pub mod models;
pub mod normalizer;
pub mod scorer;

pub use coordinator::{Generated, GenerationCoordinator, GenerationCoordinatorBuilder, RequestState};
pub use dictionary::{
    AccuracyReport, BatchValidation, CircuitBreaker, CircuitBreakerConfig, CircuitState,
    DictionaryEntry, DictionaryError, DictionarySource, DictionaryValidator, ValidationResult,
    WordListDictionary,
};
pub use error::{EngineError, ErrorBody, ErrorCode, Result};
pub use fingerprint::fingerprint;
pub use generator::{entry_cost, CombinationGenerator, MemoryTracker};
pub use metrics::{EngineMetrics, EngineStats, MetricsSink, NoopMetrics, RequestOutcome};
pub use models::{
    CacheInfo, ComplexityFilter, GenerationResult, PerformanceData, PerformanceMetrics,
    RawComplexityFilter, RawWordInput, ResourceUtilization, Statistics, Truncation,
    TruncationReason, WordCombination, WordGenerationResponse, WordInput,
};
pub use normalizer::InputNormalizer;
pub use scorer::ComplexityScorer;

pub use wordforge_config::{EngineConfig, GenerationMode};
