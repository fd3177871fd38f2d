//! Metrics port for the coordinator

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

/// How a request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Success,
    /// Succeeded with dictionary validation degraded
    Degraded,
    Failed(ErrorCode),
}

/// Sink the coordinator reports to
pub trait MetricsSink: Send + Sync {
    fn record_request(&self, outcome: RequestOutcome, elapsed: Duration);

    /// One finished enumeration, before validation
    fn record_generation(&self, total_generated: usize, retained: usize, truncated: bool);

    fn record_cache_lookup(&self, hit: bool);

    fn record_degraded_validation(&self);
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record_request(&self, _outcome: RequestOutcome, _elapsed: Duration) {}
    fn record_generation(&self, _total_generated: usize, _retained: usize, _truncated: bool) {}
    fn record_cache_lookup(&self, _hit: bool) {}
    fn record_degraded_validation(&self) {}
}

/// Snapshot of [`EngineMetrics`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStats {
    pub requests: u64,
    pub successes: u64,
    pub degraded: u64,
    pub invalid_input: u64,
    pub memory_limit_exceeded: u64,
    pub timeouts: u64,
    pub internal_errors: u64,
    pub generations: u64,
    pub candidates_generated: u64,
    pub combinations_retained: u64,
    pub truncations: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub degraded_validations: u64,
    pub avg_request_time_ms: f64,
}

impl EngineStats {
    pub fn failures(&self) -> u64 {
        self.invalid_input + self.memory_limit_exceeded + self.timeouts + self.internal_errors
    }

    pub fn cache_hit_rate(&self) -> f64 {
        let lookups = self.cache_hits + self.cache_misses;
        if lookups == 0 {
            0.0
        } else {
            (self.cache_hits as f64 / lookups as f64) * 100.0
        }
    }
}

/// In-process counters
#[derive(Debug, Default)]
pub struct EngineMetrics {
    requests: AtomicU64,
    successes: AtomicU64,
    degraded: AtomicU64,
    invalid_input: AtomicU64,
    memory_limit_exceeded: AtomicU64,
    timeouts: AtomicU64,
    internal_errors: AtomicU64,
    generations: AtomicU64,
    candidates_generated: AtomicU64,
    combinations_retained: AtomicU64,
    truncations: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    degraded_validations: AtomicU64,
    total_request_time_us: AtomicU64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> EngineStats {
        let requests = self.requests.load(Ordering::Relaxed);
        let total_us = self.total_request_time_us.load(Ordering::Relaxed);
        EngineStats {
            requests,
            successes: self.successes.load(Ordering::Relaxed),
            degraded: self.degraded.load(Ordering::Relaxed),
            invalid_input: self.invalid_input.load(Ordering::Relaxed),
            memory_limit_exceeded: self.memory_limit_exceeded.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            internal_errors: self.internal_errors.load(Ordering::Relaxed),
            generations: self.generations.load(Ordering::Relaxed),
            candidates_generated: self.candidates_generated.load(Ordering::Relaxed),
            combinations_retained: self.combinations_retained.load(Ordering::Relaxed),
            truncations: self.truncations.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            degraded_validations: self.degraded_validations.load(Ordering::Relaxed),
            avg_request_time_ms: if requests > 0 {
                total_us as f64 / requests as f64 / 1000.0
            } else {
                0.0
            },
        }
    }
}

impl MetricsSink for EngineMetrics {
    fn record_request(&self, outcome: RequestOutcome, elapsed: Duration) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.total_request_time_us
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
        let counter = match outcome {
            RequestOutcome::Success => &self.successes,
            RequestOutcome::Degraded => &self.degraded,
            RequestOutcome::Failed(ErrorCode::InvalidInput) => &self.invalid_input,
            RequestOutcome::Failed(ErrorCode::MemoryLimitExceeded) => &self.memory_limit_exceeded,
            RequestOutcome::Failed(ErrorCode::GenerationTimeout) => &self.timeouts,
            RequestOutcome::Failed(ErrorCode::DictionaryUnavailable | ErrorCode::InternalError) => {
                &self.internal_errors
            }
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn record_generation(&self, total_generated: usize, retained: usize, truncated: bool) {
        self.generations.fetch_add(1, Ordering::Relaxed);
        self.candidates_generated
            .fetch_add(total_generated as u64, Ordering::Relaxed);
        self.combinations_retained
            .fetch_add(retained as u64, Ordering::Relaxed);
        if truncated {
            self.truncations.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn record_cache_lookup(&self, hit: bool) {
        if hit {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.cache_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn record_degraded_validation(&self) {
        self.degraded_validations.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_outcomes() {
        let metrics = EngineMetrics::new();
        metrics.record_request(RequestOutcome::Success, Duration::from_millis(4));
        metrics.record_request(RequestOutcome::Degraded, Duration::from_millis(2));
        metrics.record_request(
            RequestOutcome::Failed(ErrorCode::InvalidInput),
            Duration::from_millis(0),
        );
        metrics.record_request(
            RequestOutcome::Failed(ErrorCode::GenerationTimeout),
            Duration::from_millis(10),
        );

        let stats = metrics.snapshot();
        assert_eq!(stats.requests, 4);
        assert_eq!(stats.successes, 1);
        assert_eq!(stats.degraded, 1);
        assert_eq!(stats.failures(), 2);
        assert!((stats.avg_request_time_ms - 4.0).abs() < 0.01);
    }

    #[test]
    fn test_generation_and_cache_counters() {
        let metrics = EngineMetrics::new();
        metrics.record_generation(120, 100, true);
        metrics.record_generation(5, 5, false);
        metrics.record_cache_lookup(true);
        metrics.record_cache_lookup(false);
        metrics.record_cache_lookup(false);
        metrics.record_cache_lookup(true);

        let stats = metrics.snapshot();
        assert_eq!(stats.generations, 2);
        assert_eq!(stats.candidates_generated, 125);
        assert_eq!(stats.combinations_retained, 105);
        assert_eq!(stats.truncations, 1);
        assert_eq!(stats.cache_hit_rate(), 50.0);
    }
}
