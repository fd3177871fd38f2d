//! Request orchestration
//!
//! A request moves through
//! `Received -> Normalizing -> CacheLookup -> (CacheHit | Generating -> Validating -> Scoring -> CachePut) -> Done`,
//! or ends in `Failed`. The generating half runs inside the cache's single-flight
//! computation, so it is shared by every concurrent request for the same
//! fingerprint and keeps running when a caller's deadline passes.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::instrument::{WithDispatch, WithSubscriber};
use tracing::{debug, warn, Dispatch};
use wordforge_cache::{
    CacheConfig, CacheStats, CacheStorage, Cacheable, LookupSource, MemoryStorage, ResultCache,
};
use wordforge_config::{EngineConfig, GenerationMode};

use crate::dictionary::{CircuitState, DictionarySource, DictionaryValidator, WordListDictionary};
use crate::error::{EngineError, Result};
use crate::fingerprint::fingerprint;
use crate::generator::CombinationGenerator;
use crate::metrics::{MetricsSink, NoopMetrics, RequestOutcome};
use crate::models::{CacheInfo, GenerationResult, RawWordInput, Statistics, WordGenerationResponse, WordInput};
use crate::normalizer::InputNormalizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Received,
    Normalizing,
    CacheLookup,
    CacheHit,
    Generating,
    Validating,
    Scoring,
    CachePut,
    Done,
    Failed,
}

impl RequestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestState::Received => "received",
            RequestState::Normalizing => "normalizing",
            RequestState::CacheLookup => "cache_lookup",
            RequestState::CacheHit => "cache_hit",
            RequestState::Generating => "generating",
            RequestState::Validating => "validating",
            RequestState::Scoring => "scoring",
            RequestState::CachePut => "cache_put",
            RequestState::Done => "done",
            RequestState::Failed => "failed",
        }
    }
}

struct RequestTrace {
    state: RequestState,
    fingerprint: Option<String>,
}

impl RequestTrace {
    fn new() -> Self {
        Self {
            state: RequestState::Received,
            fingerprint: None,
        }
    }

    fn resume(fingerprint: String, state: RequestState) -> Self {
        Self {
            state,
            fingerprint: Some(fingerprint),
        }
    }

    fn advance(&mut self, next: RequestState) {
        debug!(
            fingerprint = self.fingerprint.as_deref().unwrap_or("-"),
            from = self.state.as_str(),
            to = next.as_str(),
            "Request state transition"
        );
        self.state = next;
    }

    fn fail(&mut self, error: &EngineError) {
        debug!(
            fingerprint = self.fingerprint.as_deref().unwrap_or("-"),
            from = self.state.as_str(),
            code = %error.code(),
            "Request failed"
        );
        self.state = RequestState::Failed;
    }
}

/// A successful request
#[derive(Debug, Clone)]
pub struct Generated {
    pub result: Arc<GenerationResult>,
    pub fingerprint: String,
    pub source: LookupSource,
    /// The result was written to the cache by this request
    pub stored: bool,
}

impl Generated {
    pub fn cache_hit(&self) -> bool {
        self.source == LookupSource::Hit
    }
}

/// Generate, validate and score; the part of a request shared through the cache
struct Pipeline {
    generator: CombinationGenerator,
    validator: DictionaryValidator,
    batch_size: usize,
    metrics: Arc<dyn MetricsSink>,
}

impl Pipeline {
    async fn run(self: Arc<Self>, input: WordInput, fingerprint: String) -> Result<GenerationResult> {
        let started = Instant::now();
        let mut trace = RequestTrace::resume(fingerprint, RequestState::CacheLookup);
        trace.advance(RequestState::Generating);

        // Blocking threads do not inherit the task's dispatcher.
        let dispatch = tracing::dispatcher::get_default(Dispatch::clone);
        let this = Arc::clone(&self);
        let request = input.clone();
        let generated = tokio::task::spawn_blocking(move || {
            tracing::dispatcher::with_default(&dispatch, || this.generator.generate(&request))
        })
        .await
        .unwrap_or_else(|e| Err(EngineError::Internal(format!("generation task failed: {}", e))));

        let mut result = match generated {
            Ok(result) => result,
            Err(e) => {
                trace.fail(&e);
                return Err(e);
            }
        };
        self.metrics.record_generation(
            result.total_generated,
            result.combinations.len(),
            result.truncated.status,
        );

        trace.advance(RequestState::Validating);
        self.validate(&mut result, &input.language).await;

        trace.advance(RequestState::Scoring);
        result.statistics = Statistics::from_combinations(&result.combinations);
        let wall_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        result.performance_metrics.wall_time_ms = wall_time_ms;
        result.processing_time_ms = wall_time_ms.round() as u64;
        Ok(result)
    }

    /// Validate in batches. The first degraded batch marks the whole result
    /// invalid and the remaining batches are skipped.
    async fn validate(&self, result: &mut GenerationResult, language: &str) {
        let total = result.combinations.len();
        let batch_size = self.batch_size.max(1);
        let mut start = 0;

        while start < total {
            let end = (start + batch_size).min(total);
            let words: Vec<String> = result.combinations[start..end]
                .iter()
                .map(|c| c.word.clone())
                .collect();
            let batch = self.validator.validate_batch(&words, language).await;

            if let Some(warning) = batch.warning {
                for combination in result.combinations.iter_mut() {
                    combination.is_valid = false;
                    combination.definition = None;
                }
                warn!(
                    validated = start,
                    total,
                    source = self.validator.source_name(),
                    "Dictionary unavailable, returning all combinations as invalid"
                );
                self.metrics.record_degraded_validation();
                result.validation_warning = Some(warning);
                return;
            }

            for (combination, checked) in result.combinations[start..end]
                .iter_mut()
                .zip(batch.results)
            {
                combination.is_valid = checked.is_valid;
                combination.definition = checked.definition;
            }
            start = end;
        }
    }
}

/// Entry point for generation requests
pub struct GenerationCoordinator {
    normalizer: InputNormalizer,
    pipeline: Arc<Pipeline>,
    cache: ResultCache<GenerationResult, EngineError>,
    metrics: Arc<dyn MetricsSink>,
    dispatch: Option<Dispatch>,
    mode: GenerationMode,
    request_timeout: Duration,
}

impl GenerationCoordinator {
    pub fn new(config: EngineConfig, dictionary: Arc<dyn DictionarySource>) -> Self {
        GenerationCoordinatorBuilder::new(config)
            .dictionary(dictionary)
            .build()
    }

    pub fn builder(config: EngineConfig) -> GenerationCoordinatorBuilder {
        GenerationCoordinatorBuilder::new(config)
    }

    /// Run a request and wrap the outcome for the boundary
    pub async fn generate(&self, raw: &RawWordInput) -> WordGenerationResponse {
        let (outcome, fingerprint, elapsed) = self.with_logger(self.run_request(raw)).await;
        let elapsed_ms = elapsed.as_millis() as u64;

        match outcome {
            Ok(generated) => {
                let cache_info = CacheInfo {
                    hit: generated.cache_hit(),
                    fingerprint: Some(generated.fingerprint),
                };
                WordGenerationResponse::succeeded(generated.result, cache_info, elapsed_ms)
            }
            Err(err) => {
                let cache_info = CacheInfo {
                    hit: false,
                    fingerprint,
                };
                WordGenerationResponse::failed(&err, cache_info, elapsed_ms)
            }
        }
    }

    /// Run a request and return the shared result or the fatal error
    pub async fn try_generate(&self, raw: &RawWordInput) -> Result<Generated> {
        let (outcome, _, _) = self.with_logger(self.run_request(raw)).await;
        outcome
    }

    pub fn mode(&self) -> GenerationMode {
        self.mode
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Computations currently running
    pub fn in_flight(&self) -> usize {
        self.cache.in_flight()
    }

    pub fn dictionary_circuit(&self) -> CircuitState {
        self.pipeline.validator.breaker().state()
    }

    fn with_logger<F: Future>(&self, fut: F) -> WithDispatch<F> {
        let dispatch = match &self.dispatch {
            Some(dispatch) => dispatch.clone(),
            None => tracing::dispatcher::get_default(Dispatch::clone),
        };
        fut.with_subscriber(dispatch)
    }

    async fn run_request(&self, raw: &RawWordInput) -> (Result<Generated>, Option<String>, Duration) {
        let started = Instant::now();
        let mut trace = RequestTrace::new();
        let outcome = self.execute(raw, &mut trace).await;
        let elapsed = started.elapsed();

        let recorded = match &outcome {
            Ok(generated) if generated.result.is_degraded() => RequestOutcome::Degraded,
            Ok(_) => RequestOutcome::Success,
            Err(e) => {
                trace.fail(e);
                RequestOutcome::Failed(e.code())
            }
        };
        self.metrics.record_request(recorded, elapsed);

        (outcome, trace.fingerprint, elapsed)
    }

    async fn execute(&self, raw: &RawWordInput, trace: &mut RequestTrace) -> Result<Generated> {
        trace.advance(RequestState::Normalizing);
        let input = self.normalizer.normalize(raw)?;
        let key = fingerprint(&input, self.mode);
        trace.fingerprint = Some(key.clone());
        trace.advance(RequestState::CacheLookup);

        let pipeline = Arc::clone(&self.pipeline);
        let flight_key = key.clone();
        let lookup = self
            .cache
            .get_or_compute(&key, move || pipeline.run(input, flight_key));

        let lookup = match tokio::time::timeout(self.request_timeout, lookup).await {
            Ok(lookup) => lookup?,
            Err(_) => {
                let timeout_ms = self.request_timeout.as_millis() as u64;
                warn!(
                    fingerprint = %key,
                    timeout_ms,
                    "Request deadline passed, computation continues in the background"
                );
                return Err(EngineError::GenerationTimeout { timeout_ms });
            }
        };

        let hit = lookup.is_hit();
        self.metrics.record_cache_lookup(hit);
        if hit {
            trace.advance(RequestState::CacheHit);
        } else if lookup.stored {
            trace.advance(RequestState::CachePut);
        }
        trace.advance(RequestState::Done);

        Ok(Generated {
            result: lookup.value,
            fingerprint: key,
            source: lookup.source,
            stored: lookup.stored,
        })
    }
}

/// Wires a coordinator's collaborators
pub struct GenerationCoordinatorBuilder {
    config: EngineConfig,
    dictionary: Option<Arc<dyn DictionarySource>>,
    storage: Option<Arc<dyn CacheStorage>>,
    metrics: Option<Arc<dyn MetricsSink>>,
    dispatch: Option<Dispatch>,
}

impl GenerationCoordinatorBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            dictionary: None,
            storage: None,
            metrics: None,
            dispatch: None,
        }
    }

    pub fn dictionary(mut self, dictionary: Arc<dyn DictionarySource>) -> Self {
        self.dictionary = Some(dictionary);
        self
    }

    /// Backing store for cached results, in-memory by default
    pub fn storage(mut self, storage: Arc<dyn CacheStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Dispatcher every log line of this coordinator goes to, including the
    /// ones emitted from spawned and blocking work
    pub fn logger(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    pub fn build(self) -> GenerationCoordinator {
        let config = self.config;
        let metrics = self.metrics.unwrap_or_else(|| Arc::new(NoopMetrics));
        let dictionary = self.dictionary.unwrap_or_else(|| {
            debug!("No dictionary configured, every word will be reported invalid");
            Arc::new(WordListDictionary::new("empty"))
        });
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()));

        let generator = CombinationGenerator::new(&config.generation);
        let validator = DictionaryValidator::new(
            dictionary,
            &config.dictionary,
            *generator.scorer(),
        );
        let cache = ResultCache::with_config(
            storage,
            CacheConfig {
                ttl: Some(config.cache.ttl()),
                enable_metrics: config.cache.enable_metrics,
            },
        );

        GenerationCoordinator {
            normalizer: InputNormalizer::new(&config.generation),
            mode: config.generation.mode,
            request_timeout: config.coordinator.request_timeout(),
            pipeline: Arc::new(Pipeline {
                generator,
                validator,
                batch_size: config.dictionary.batch_size,
                metrics: Arc::clone(&metrics),
            }),
            cache,
            metrics,
            dispatch: self.dispatch,
        }
    }
}
