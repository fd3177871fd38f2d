//! Request, result and response types
//!
//! Everything that crosses the request boundary serializes in `camelCase`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wordforge_cache::Cacheable;

use crate::error::{EngineError, ErrorBody};

pub(crate) const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Untrusted request payload as received from the boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWordInput {
    /// Letters to draw from; a JSON string or an array of strings
    #[serde(default)]
    pub characters: serde_json::Value,
    #[serde(default)]
    pub language: Option<String>,
    pub min_length: i64,
    pub max_length: i64,
    #[serde(default)]
    pub filters: Option<RawComplexityFilter>,
}

impl RawWordInput {
    pub fn new(characters: impl Into<String>, min_length: i64, max_length: i64) -> Self {
        Self {
            characters: serde_json::Value::String(characters.into()),
            language: None,
            min_length,
            max_length,
            filters: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_filters(mut self, min_complexity: i64, max_complexity: i64) -> Self {
        self.filters = Some(RawComplexityFilter {
            min_complexity,
            max_complexity,
        });
        self
    }
}

/// Unvalidated complexity bounds; a missing side defaults to the full range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawComplexityFilter {
    #[serde(default = "default_min_complexity")]
    pub min_complexity: i64,
    #[serde(default = "default_max_complexity")]
    pub max_complexity: i64,
}

fn default_min_complexity() -> i64 {
    1
}

fn default_max_complexity() -> i64 {
    10
}

/// Normalized generation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordInput {
    /// Upper-case letters in the order the caller supplied them
    pub characters: String,
    /// Lower-case language code
    pub language: String,
    pub min_length: usize,
    pub max_length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<ComplexityFilter>,
}

impl WordInput {
    /// Number of letters available to the generator
    pub fn letter_count(&self) -> usize {
        self.characters.chars().count()
    }
}

/// Inclusive complexity range a combination must fall in to be kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexityFilter {
    pub min_complexity: u8,
    pub max_complexity: u8,
}

impl ComplexityFilter {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    /// Build a filter, checking both bounds lie in `1..=10` and are ordered
    pub fn new(min_complexity: i64, max_complexity: i64) -> Result<Self, EngineError> {
        let range = i64::from(Self::MIN)..=i64::from(Self::MAX);
        if !range.contains(&min_complexity) || !range.contains(&max_complexity) {
            return Err(EngineError::InvalidInput(format!(
                "complexity filter bounds must be between {} and {}, got {}..{}",
                Self::MIN,
                Self::MAX,
                min_complexity,
                max_complexity
            )));
        }
        if min_complexity > max_complexity {
            return Err(EngineError::InvalidInput(format!(
                "minComplexity {} is greater than maxComplexity {}",
                min_complexity, max_complexity
            )));
        }
        Ok(Self {
            min_complexity: min_complexity as u8,
            max_complexity: max_complexity as u8,
        })
    }

    pub fn contains(&self, complexity: f64) -> bool {
        complexity >= f64::from(self.min_complexity) && complexity <= f64::from(self.max_complexity)
    }
}

/// One candidate word
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordCombination {
    pub word: String,
    /// Whole number in `1..=10`
    pub complexity: f64,
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
}

impl WordCombination {
    pub fn new(word: impl Into<String>, complexity: f64) -> Self {
        Self {
            word: word.into(),
            complexity,
            is_valid: false,
            definition: None,
        }
    }
}

/// Why enumeration stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TruncationReason {
    MaxCombinationsReached,
    /// The walk visited its node budget before finishing
    MaxCandidatesReached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Truncation {
    pub status: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<TruncationReason>,
}

impl Truncation {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn at_cap() -> Self {
        Self {
            status: true,
            reason: Some(TruncationReason::MaxCombinationsReached),
        }
    }

    pub fn at_candidate_budget() -> Self {
        Self {
            status: true,
            reason: Some(TruncationReason::MaxCandidatesReached),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub valid_words: usize,
    /// Mean complexity over retained combinations, 0 when there are none
    pub average_complexity: f64,
}

impl Statistics {
    pub fn from_combinations(combinations: &[WordCombination]) -> Self {
        let valid_words = combinations.iter().filter(|c| c.is_valid).count();
        let average_complexity = if combinations.is_empty() {
            0.0
        } else {
            combinations.iter().map(|c| c.complexity).sum::<f64>() / combinations.len() as f64
        };
        Self {
            valid_words,
            average_complexity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    /// Time spent in the CPU-bound enumeration
    pub cpu_time_ms: f64,
    /// Wall-clock time of the whole computation
    pub wall_time_ms: f64,
    /// Tracked size of the retained result set
    pub memory_usage_mb: f64,
}

/// Output of one generation computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub combinations: Vec<WordCombination>,
    /// Every candidate enumerated, including those the complexity filter dropped
    pub total_generated: usize,
    pub truncated: Truncation,
    pub statistics: Statistics,
    pub performance_metrics: PerformanceMetrics,
    pub processing_time_ms: u64,
    pub generated_at: DateTime<Utc>,
    /// Set when dictionary validation was degraded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_warning: Option<ErrorBody>,
}

impl GenerationResult {
    pub fn is_degraded(&self) -> bool {
        self.validation_warning.is_some()
    }

    pub fn valid_combinations(&self) -> impl Iterator<Item = &WordCombination> {
        self.combinations.iter().filter(|c| c.is_valid)
    }
}

impl Cacheable for GenerationResult {
    // A degraded result would pin "everything invalid" for a whole TTL.
    fn is_cacheable(&self) -> bool {
        !self.is_degraded()
    }

    fn size_hint(&self) -> u64 {
        (self.performance_metrics.memory_usage_mb * BYTES_PER_MB) as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheInfo {
    pub hit: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceUtilization {
    /// Tracked result-set memory in MB
    pub memory: f64,
    /// CPU-time share of the computation's wall-clock time, in percent
    pub cpu: f64,
}

impl ResourceUtilization {
    pub fn from_metrics(metrics: &PerformanceMetrics) -> Self {
        let cpu = if metrics.wall_time_ms > 0.0 {
            (metrics.cpu_time_ms / metrics.wall_time_ms * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
        Self {
            memory: metrics.memory_usage_mb,
            cpu,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceData {
    pub resource_utilization: ResourceUtilization,
    /// Time this request spent in the coordinator
    pub elapsed_ms: u64,
}

/// Response handed back to the request boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordGenerationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Arc<GenerationResult>>,
    /// Fatal error, or the degraded-validation warning when `success` is true
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub cache_info: CacheInfo,
    pub performance_data: PerformanceData,
}

impl WordGenerationResponse {
    pub fn succeeded(data: Arc<GenerationResult>, cache_info: CacheInfo, elapsed_ms: u64) -> Self {
        let performance_data = PerformanceData {
            resource_utilization: ResourceUtilization::from_metrics(&data.performance_metrics),
            elapsed_ms,
        };
        Self {
            success: true,
            error: data.validation_warning.clone(),
            data: Some(data),
            cache_info,
            performance_data,
        }
    }

    pub fn failed(error: &EngineError, cache_info: CacheInfo, elapsed_ms: u64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_body()),
            cache_info,
            performance_data: PerformanceData {
                resource_utilization: ResourceUtilization::default(),
                elapsed_ms,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn sample_result() -> GenerationResult {
        let mut valid = WordCombination::new("CAT", 4.0);
        valid.is_valid = true;
        valid.definition = Some("a small feline".to_string());
        let combinations = vec![valid, WordCombination::new("TCA", 3.0)];
        GenerationResult {
            statistics: Statistics::from_combinations(&combinations),
            combinations,
            total_generated: 5,
            truncated: Truncation::none(),
            performance_metrics: PerformanceMetrics {
                cpu_time_ms: 2.0,
                wall_time_ms: 8.0,
                memory_usage_mb: 0.5,
            },
            processing_time_ms: 8,
            generated_at: Utc::now(),
            validation_warning: None,
        }
    }

    #[test]
    fn test_raw_input_accepts_camel_case() {
        let raw: RawWordInput = serde_json::from_value(serde_json::json!({
            "characters": "abc",
            "minLength": 1,
            "maxLength": 3,
            "filters": { "minComplexity": 2 }
        }))
        .unwrap();
        assert_eq!(raw.min_length, 1);
        assert_eq!(raw.language, None);
        assert_eq!(
            raw.filters,
            Some(RawComplexityFilter {
                min_complexity: 2,
                max_complexity: 10
            })
        );
    }

    #[test]
    fn test_complexity_filter_bounds() {
        assert!(ComplexityFilter::new(1, 10).is_ok());
        assert!(ComplexityFilter::new(0, 5).is_err());
        assert!(ComplexityFilter::new(3, 11).is_err());
        assert!(ComplexityFilter::new(7, 3).is_err());

        let filter = ComplexityFilter::new(3, 5).unwrap();
        assert!(filter.contains(3.0));
        assert!(filter.contains(5.0));
        assert!(!filter.contains(6.0));
    }

    #[test]
    fn test_statistics() {
        let result = sample_result();
        assert_eq!(result.statistics.valid_words, 1);
        assert_eq!(result.statistics.average_complexity, 3.5);
        assert_eq!(Statistics::from_combinations(&[]), Statistics::default());
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let json = serde_json::to_value(sample_result()).unwrap();
        assert!(json.get("totalGenerated").is_some());
        assert!(json.get("performanceMetrics").unwrap().get("cpuTimeMs").is_some());
        assert_eq!(json["combinations"][0]["isValid"], true);
        assert!(json["combinations"][1].get("definition").is_none());
        assert!(json.get("validationWarning").is_none());
    }

    #[test]
    fn test_truncation_reason_serialization() {
        let json = serde_json::to_value(Truncation::at_cap()).unwrap();
        assert_eq!(json["status"], true);
        assert_eq!(json["reason"], "MAX_COMBINATIONS_REACHED");
    }

    #[test]
    fn test_degraded_result_is_not_cacheable() {
        let mut result = sample_result();
        assert!(result.is_cacheable());
        assert_eq!(result.size_hint(), 512 * 1024);

        result.validation_warning = Some(ErrorBody {
            code: ErrorCode::DictionaryUnavailable,
            message: "down".to_string(),
        });
        assert!(!result.is_cacheable());
    }

    #[test]
    fn test_result_survives_json_value_round_trip() {
        let result = sample_result();
        let value = serde_json::to_value(&result).unwrap();
        let back: GenerationResult = serde_json::from_value(value).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn test_response_carries_warning_and_cpu_share() {
        let mut result = sample_result();
        result.validation_warning = Some(ErrorBody {
            code: ErrorCode::DictionaryUnavailable,
            message: "down".to_string(),
        });
        let response = WordGenerationResponse::succeeded(Arc::new(result), CacheInfo::default(), 9);
        assert!(response.success);
        assert_eq!(
            response.error.as_ref().map(|e| e.code),
            Some(ErrorCode::DictionaryUnavailable)
        );
        assert_eq!(response.performance_data.resource_utilization.cpu, 25.0);
        assert_eq!(response.performance_data.resource_utilization.memory, 0.5);
    }

    #[test]
    fn test_failed_response() {
        let err = EngineError::GenerationTimeout { timeout_ms: 10 };
        let response = WordGenerationResponse::failed(&err, CacheInfo::default(), 10);
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(
            response.error.map(|e| e.code),
            Some(ErrorCode::GenerationTimeout)
        );
    }
}
