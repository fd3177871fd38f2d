//! Circuit breaker around dictionary lookups
//!
//! After `failure_threshold` failed batches inside `failure_window` the circuit
//! opens and batches are marked invalid without calling the source. Once
//! `recovery_timeout` has passed, probes are let through (HalfOpen);
//! `success_threshold` successful probes close the circuit and any failed probe
//! reopens it.

use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::{debug, info, warn};
use wordforge_config::CircuitBreakerSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Lookups flow through normally
    Closed,
    /// Lookups are skipped
    Open,
    /// Probing whether the source has recovered
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "Closed"),
            CircuitState::Open => write!(f, "Open"),
            CircuitState::HalfOpen => write!(f, "HalfOpen"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub recovery_timeout: Duration,
    pub success_threshold: u32,
    pub failure_window: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        CircuitBreakerSettings::default().into()
    }
}

impl From<CircuitBreakerSettings> for CircuitBreakerConfig {
    fn from(settings: CircuitBreakerSettings) -> Self {
        Self {
            failure_threshold: settings.failure_threshold,
            recovery_timeout: Duration::from_millis(settings.recovery_timeout_ms),
            success_threshold: settings.success_threshold,
            failure_window: Duration::from_millis(settings.failure_window_ms),
        }
    }
}

impl CircuitBreakerConfig {
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn with_recovery_timeout(mut self, timeout: Duration) -> Self {
        self.recovery_timeout = timeout;
        self
    }

    pub fn with_success_threshold(mut self, threshold: u32) -> Self {
        self.success_threshold = threshold;
        self
    }

    pub fn with_failure_window(mut self, window: Duration) -> Self {
        self.failure_window = window;
        self
    }
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    last_failure_at: Option<Instant>,
    opened_at: Option<Instant>,
}

impl Default for BreakerState {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            last_failure_at: None,
            opened_at: None,
        }
    }
}

impl BreakerState {
    fn open(&mut self) {
        self.state = CircuitState::Open;
        self.opened_at = Some(Instant::now());
        self.success_count = 0;
    }
}

/// Closed/Open/HalfOpen breaker for one dictionary source
#[derive(Debug)]
pub struct CircuitBreaker {
    source_name: String,
    config: CircuitBreakerConfig,
    state: RwLock<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(source_name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            source_name: source_name.into(),
            config,
            state: RwLock::new(BreakerState::default()),
        }
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// State as a caller would observe it now, counting an elapsed recovery timeout as HalfOpen
    pub fn state(&self) -> CircuitState {
        let state = self.state.read();
        match state.state {
            CircuitState::Open if self.recovery_elapsed(&state) => CircuitState::HalfOpen,
            other => other,
        }
    }

    /// Whether a lookup may be attempted
    pub fn can_execute(&self) -> bool {
        let mut state = self.state.write();
        match state.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                if self.recovery_elapsed(&state) {
                    state.state = CircuitState::HalfOpen;
                    state.success_count = 0;
                    info!(source = %self.source_name, "Dictionary circuit half-open, probing");
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut state = self.state.write();
        match state.state {
            CircuitState::Closed => {
                state.failure_count = 0;
            }
            CircuitState::HalfOpen => {
                state.success_count += 1;
                debug!(
                    source = %self.source_name,
                    successes = state.success_count,
                    needed = self.config.success_threshold,
                    "Dictionary probe succeeded"
                );
                if state.success_count >= self.config.success_threshold {
                    *state = BreakerState::default();
                    info!(source = %self.source_name, "Dictionary circuit closed");
                }
            }
            CircuitState::Open => {
                warn!(source = %self.source_name, "Success recorded while circuit open");
            }
        }
    }

    pub fn record_failure(&self) {
        let mut state = self.state.write();

        if let Some(last) = state.last_failure_at {
            if last.elapsed() >= self.config.failure_window {
                state.failure_count = 0;
            }
        }
        state.failure_count += 1;
        state.last_failure_at = Some(Instant::now());

        match state.state {
            CircuitState::Closed => {
                debug!(
                    source = %self.source_name,
                    failures = state.failure_count,
                    threshold = self.config.failure_threshold,
                    "Dictionary lookup failed"
                );
                if state.failure_count >= self.config.failure_threshold {
                    state.open();
                    warn!(
                        source = %self.source_name,
                        failures = state.failure_count,
                        "Dictionary circuit opened"
                    );
                }
            }
            CircuitState::HalfOpen => {
                state.open();
                warn!(source = %self.source_name, "Dictionary probe failed, circuit reopened");
            }
            CircuitState::Open => {}
        }
    }

    pub fn reset(&self) {
        *self.state.write() = BreakerState::default();
        debug!(source = %self.source_name, "Dictionary circuit reset");
    }

    pub fn failure_count(&self) -> u32 {
        self.state.read().failure_count
    }

    fn recovery_elapsed(&self, state: &BreakerState) -> bool {
        state
            .opened_at
            .map(|opened| opened.elapsed() >= self.config.recovery_timeout)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(threshold: u32) -> CircuitBreaker {
        CircuitBreaker::new(
            "words",
            CircuitBreakerConfig::default().with_failure_threshold(threshold),
        )
    }

    #[test]
    fn test_starts_closed() {
        let cb = breaker(3);
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.can_execute());
        assert_eq!(cb.source_name(), "words");
    }

    #[test]
    fn test_opens_after_threshold() {
        let cb = breaker(3);
        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.can_execute());
    }

    #[test]
    fn test_success_clears_failures() {
        let cb = breaker(3);
        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        assert_eq!(cb.failure_count(), 0);
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_failures_outside_window_are_forgotten() {
        let cb = CircuitBreaker::new(
            "words",
            CircuitBreakerConfig::default()
                .with_failure_threshold(2)
                .with_failure_window(Duration::from_millis(5)),
        );
        cb.record_failure();
        std::thread::sleep(Duration::from_millis(10));
        cb.record_failure();
        assert_eq!(cb.failure_count(), 1);
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_closes_after_successes() {
        let cb = CircuitBreaker::new(
            "words",
            CircuitBreakerConfig::default()
                .with_failure_threshold(1)
                .with_success_threshold(2)
                .with_recovery_timeout(Duration::from_millis(1)),
        );
        cb.record_failure();
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        assert!(cb.can_execute());

        cb.record_success();
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_failure_reopens() {
        let cb = CircuitBreaker::new(
            "words",
            CircuitBreakerConfig::default()
                .with_failure_threshold(1)
                .with_recovery_timeout(Duration::from_millis(20)),
        );
        cb.record_failure();
        std::thread::sleep(Duration::from_millis(30));
        assert!(cb.can_execute());

        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.can_execute());
    }

    #[test]
    fn test_reset() {
        let cb = breaker(1);
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        cb.reset();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.failure_count(), 0);
    }

    #[test]
    fn test_config_from_settings() {
        let config: CircuitBreakerConfig = CircuitBreakerSettings {
            failure_threshold: 2,
            recovery_timeout_ms: 1_500,
            success_threshold: 1,
            failure_window_ms: 10_000,
        }
        .into();
        assert_eq!(config.failure_threshold, 2);
        assert_eq!(config.recovery_timeout, Duration::from_millis(1_500));
        assert_eq!(config.failure_window, Duration::from_secs(10));
    }
}
