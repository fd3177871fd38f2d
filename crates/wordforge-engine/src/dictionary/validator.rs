//! Batch validation against a dictionary source
//!
//! Each batch gets one attempt, bounded by the lookup timeout and gated by the
//! circuit breaker. A batch that cannot be answered comes back with every word
//! invalid and a `DICTIONARY_UNAVAILABLE` warning; it never fails the request.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use wordforge_config::DictionarySettings;

use super::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use super::{DictionaryEntry, DictionaryError, DictionarySource};
use crate::error::{EngineError, ErrorBody};
use crate::scorer::ComplexityScorer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub word: String,
    pub is_valid: bool,
    pub complexity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
}

/// Results for one batch, in input order
#[derive(Debug, Clone, PartialEq)]
pub struct BatchValidation {
    pub results: Vec<ValidationResult>,
    /// Present when the batch could not be validated
    pub warning: Option<ErrorBody>,
}

impl BatchValidation {
    pub fn is_degraded(&self) -> bool {
        self.warning.is_some()
    }
}

/// Outcome of checking the validator against labelled words
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracyReport {
    pub total: usize,
    pub correct: usize,
    pub accuracy: f64,
    pub target: f64,
    pub degraded: bool,
}

impl AccuracyReport {
    pub fn meets_target(&self) -> bool {
        self.accuracy >= self.target
    }
}

pub struct DictionaryValidator {
    source: Arc<dyn DictionarySource>,
    breaker: Arc<CircuitBreaker>,
    scorer: ComplexityScorer,
    timeout: Duration,
    accuracy_target: f64,
}

impl DictionaryValidator {
    pub fn new(
        source: Arc<dyn DictionarySource>,
        settings: &DictionarySettings,
        scorer: ComplexityScorer,
    ) -> Self {
        let breaker = Arc::new(CircuitBreaker::new(
            source.name(),
            CircuitBreakerConfig::from(settings.circuit_breaker.clone()),
        ));
        Self {
            source,
            breaker,
            scorer,
            timeout: settings.timeout(),
            accuracy_target: settings.accuracy_target,
        }
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub async fn validate_batch(&self, words: &[String], language: &str) -> BatchValidation {
        if words.is_empty() {
            return BatchValidation {
                results: Vec::new(),
                warning: None,
            };
        }

        if !self.breaker.can_execute() {
            debug!(source = self.source.name(), batch = words.len(), "Circuit open, skipping lookup");
            return self.degraded(
                words,
                DictionaryError::CircuitOpen {
                    source_name: self.source.name().to_string(),
                },
            );
        }

        let attempt = tokio::time::timeout(self.timeout, self.source.lookup(words, language)).await;
        let entries = match attempt {
            Ok(Ok(entries)) => entries,
            Ok(Err(e)) => {
                self.breaker.record_failure();
                return self.degraded(words, e);
            }
            Err(_) => {
                self.breaker.record_failure();
                return self.degraded(
                    words,
                    DictionaryError::Timeout {
                        timeout_ms: self.timeout.as_millis() as u64,
                    },
                );
            }
        };
        self.breaker.record_success();

        let answers: HashMap<String, DictionaryEntry> = entries
            .into_iter()
            .map(|entry| (entry.word.to_uppercase(), entry))
            .collect();

        let results = words
            .iter()
            .map(|word| {
                // Case variants of one word share an answer.
                let (is_valid, definition) = match answers.get(&word.to_uppercase()) {
                    Some(entry) if entry.is_valid => (true, entry.definition.clone()),
                    _ => (false, None),
                };
                ValidationResult {
                    word: word.clone(),
                    is_valid,
                    complexity: self.scorer.score(word),
                    definition,
                }
            })
            .collect();

        BatchValidation {
            results,
            warning: None,
        }
    }

    /// Classify `ground_truth` words and compare against their labels.
    ///
    /// A degraded lookup counts every word as invalid, the same answer a
    /// request would see.
    pub async fn measure_accuracy(&self, ground_truth: &[(String, bool)], language: &str) -> AccuracyReport {
        let words: Vec<String> = ground_truth.iter().map(|(word, _)| word.clone()).collect();
        let batch = self.validate_batch(&words, language).await;

        let correct = batch
            .results
            .iter()
            .zip(ground_truth)
            .filter(|(result, (_, expected))| result.is_valid == *expected)
            .count();
        let total = ground_truth.len();
        let accuracy = if total == 0 {
            1.0
        } else {
            correct as f64 / total as f64
        };

        AccuracyReport {
            total,
            correct,
            accuracy,
            target: self.accuracy_target,
            degraded: batch.is_degraded(),
        }
    }

    fn degraded(&self, words: &[String], cause: DictionaryError) -> BatchValidation {
        warn!(
            source = self.source.name(),
            batch = words.len(),
            error = %cause,
            "Dictionary validation degraded"
        );
        let results = words
            .iter()
            .map(|word| ValidationResult {
                word: word.clone(),
                is_valid: false,
                complexity: self.scorer.score(word),
                definition: None,
            })
            .collect();
        BatchValidation {
            results,
            warning: Some(EngineError::DictionaryUnavailable(cause.to_string()).to_body()),
        }
    }
}
