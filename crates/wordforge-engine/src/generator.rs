//! Candidate enumeration under count and memory budgets
//!
//! Letters are grouped into sorted `(letter, remaining)` pairs and walked
//! depth-first. Permutation mode may pick any letter with copies left at every
//! step; subsequence mode only picks letters at or after the previous pick, so
//! each sub-multiset appears once in sorted order. Either way every candidate is
//! produced exactly once and the order only depends on the input.
//!
//! Three budgets bound a request: retained combinations, the tracked memory of
//! the retained set, and the number of nodes the walk may visit. The last one
//! also covers nodes that are filtered out or shorter than `min_length`.

use std::collections::BTreeMap;
use std::mem::size_of;
use std::ops::ControlFlow;
use std::time::Instant;

use chrono::Utc;
use tracing::debug;
use wordforge_config::{GenerationMode, GenerationSettings};

use crate::error::{EngineError, Result};
use crate::models::{
    ComplexityFilter, GenerationResult, PerformanceMetrics, Statistics, Truncation,
    WordCombination, WordInput, BYTES_PER_MB,
};
use crate::scorer::ComplexityScorer;

/// Approximate heap and inline cost of retaining one combination
pub fn entry_cost(word: &str) -> u64 {
    let heap = word.len().div_ceil(16) * 16;
    (size_of::<WordCombination>() + heap) as u64
}

/// Running total of the retained result set, local to one request
#[derive(Debug, Clone, Copy)]
pub struct MemoryTracker {
    used_bytes: u64,
    limit_bytes: u64,
}

impl MemoryTracker {
    pub fn new(limit_bytes: u64) -> Self {
        Self {
            used_bytes: 0,
            limit_bytes,
        }
    }

    /// Account for `bytes` more, or report the total it would have reached
    pub fn reserve(&mut self, bytes: u64) -> std::result::Result<(), u64> {
        let next = self.used_bytes.saturating_add(bytes);
        if next > self.limit_bytes {
            return Err(next);
        }
        self.used_bytes = next;
        Ok(())
    }

    pub fn used_bytes(&self) -> u64 {
        self.used_bytes
    }

    pub fn limit_bytes(&self) -> u64 {
        self.limit_bytes
    }

    pub fn used_mb(&self) -> f64 {
        self.used_bytes as f64 / BYTES_PER_MB
    }
}

#[derive(Debug)]
enum Stop {
    CapReached,
    CandidateBudget,
    MemoryExceeded { used_bytes: u64, limit_bytes: u64 },
}

/// Enumerates and scores candidate words
#[derive(Debug, Clone)]
pub struct CombinationGenerator {
    scorer: ComplexityScorer,
    mode: GenerationMode,
    max_combinations: usize,
    memory_limit_bytes: u64,
    max_candidates: usize,
    min_characters: usize,
}

impl CombinationGenerator {
    pub fn new(settings: &GenerationSettings) -> Self {
        Self {
            scorer: ComplexityScorer::new(settings.saturation_length),
            mode: settings.mode,
            max_combinations: settings.max_combinations,
            memory_limit_bytes: settings.memory_limit_bytes,
            max_candidates: settings.max_candidates,
            min_characters: settings.min_characters,
        }
    }

    pub fn mode(&self) -> GenerationMode {
        self.mode
    }

    pub fn scorer(&self) -> &ComplexityScorer {
        &self.scorer
    }

    /// Enumerate every candidate for `input`.
    ///
    /// Stops quietly at `max_combinations` or after `max_candidates` visited
    /// nodes (both reported through `truncated`) and fails with `MemoryLimitExceeded` if the retained set outgrows its budget.
    pub fn generate(&self, input: &WordInput) -> Result<GenerationResult> {
        let started = Instant::now();
        self.check(input)?;

        let mut counts: BTreeMap<char, usize> = BTreeMap::new();
        for c in input.characters.chars() {
            *counts.entry(c).or_default() += 1;
        }

        let mut walk = Walk {
            scorer: &self.scorer,
            filter: input.filters,
            min_length: input.min_length,
            max_length: input.max_length,
            max_combinations: self.max_combinations,
            max_candidates: self.max_candidates,
            visited: 0,
            counts: counts.into_iter().collect(),
            prefix: String::with_capacity(input.max_length * 4),
            depth: 0,
            combinations: Vec::new(),
            memory: MemoryTracker::new(self.memory_limit_bytes),
            total_generated: 0,
        };

        let enumeration = Instant::now();
        let outcome = match self.mode {
            GenerationMode::Permutations => walk.permutations(),
            GenerationMode::Subsequences => walk.subsequences(0),
        };
        let cpu_time_ms = enumeration.elapsed().as_secs_f64() * 1000.0;

        let truncated = match outcome {
            ControlFlow::Continue(()) => Truncation::none(),
            ControlFlow::Break(Stop::CapReached) => Truncation::at_cap(),
            ControlFlow::Break(Stop::CandidateBudget) => {
                debug!(
                    visited = walk.visited,
                    retained = walk.combinations.len(),
                    "Enumeration stopped at candidate budget"
                );
                Truncation::at_candidate_budget()
            }
            ControlFlow::Break(Stop::MemoryExceeded {
                used_bytes,
                limit_bytes,
            }) => {
                debug!(
                    used_bytes,
                    limit_bytes,
                    retained = walk.combinations.len(),
                    "Enumeration aborted at memory limit"
                );
                return Err(EngineError::MemoryLimitExceeded {
                    used_bytes,
                    limit_bytes,
                });
            }
        };

        let wall_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        debug!(
            mode = %self.mode,
            total_generated = walk.total_generated,
            retained = walk.combinations.len(),
            truncated = truncated.status,
            memory_bytes = walk.memory.used_bytes(),
            "Enumeration finished"
        );

        Ok(GenerationResult {
            statistics: Statistics::from_combinations(&walk.combinations),
            total_generated: walk.total_generated,
            truncated,
            performance_metrics: PerformanceMetrics {
                cpu_time_ms,
                wall_time_ms,
                memory_usage_mb: walk.memory.used_mb(),
            },
            processing_time_ms: wall_time_ms.round() as u64,
            generated_at: Utc::now(),
            validation_warning: None,
            combinations: walk.combinations,
        })
    }

    /// Structural checks repeated here in case a caller skipped normalization.
    /// The upper letter-count ceiling belongs to the normalizer; the memory
    /// budget is what bounds the generator.
    fn check(&self, input: &WordInput) -> Result<()> {
        let count = input.letter_count();
        if count == 0 {
            return Err(EngineError::InvalidInput("no letters to generate from".into()));
        }
        if !input
            .characters
            .chars()
            .all(|c| c.is_alphabetic() && !c.is_lowercase())
        {
            return Err(EngineError::InvalidInput(
                "letters must be normalized to upper case".into(),
            ));
        }
        if count < self.min_characters {
            return Err(EngineError::InvalidInput(format!(
                "at least {} letters are required, got {}",
                self.min_characters, count
            )));
        }
        if input.min_length < 1 || input.min_length > input.max_length || input.max_length > count
        {
            return Err(EngineError::InvalidInput(format!(
                "length bounds {}..={} do not fit {} letters",
                input.min_length, input.max_length, count
            )));
        }
        Ok(())
    }
}

struct Walk<'a> {
    scorer: &'a ComplexityScorer,
    filter: Option<ComplexityFilter>,
    min_length: usize,
    max_length: usize,
    max_combinations: usize,
    max_candidates: usize,
    visited: usize,
    counts: Vec<(char, usize)>,
    prefix: String,
    depth: usize,
    combinations: Vec<WordCombination>,
    memory: MemoryTracker,
    total_generated: usize,
}

impl Walk<'_> {
    fn permutations(&mut self) -> ControlFlow<Stop> {
        for idx in 0..self.counts.len() {
            if self.counts[idx].1 == 0 {
                continue;
            }
            self.visit()?;
            self.push(idx);
            if self.depth >= self.min_length {
                self.emit()?;
            }
            if self.depth < self.max_length {
                self.permutations()?;
            }
            self.pop(idx);
        }
        ControlFlow::Continue(())
    }

    fn subsequences(&mut self, from: usize) -> ControlFlow<Stop> {
        for idx in from..self.counts.len() {
            if self.counts[idx].1 == 0 {
                continue;
            }
            self.visit()?;
            self.push(idx);
            if self.depth >= self.min_length {
                self.emit()?;
            }
            if self.depth < self.max_length {
                self.subsequences(idx)?;
            }
            self.pop(idx);
        }
        ControlFlow::Continue(())
    }

    fn visit(&mut self) -> ControlFlow<Stop> {
        if self.visited >= self.max_candidates {
            return ControlFlow::Break(Stop::CandidateBudget);
        }
        self.visited += 1;
        ControlFlow::Continue(())
    }

    fn push(&mut self, idx: usize) {
        let (letter, remaining) = &mut self.counts[idx];
        *remaining -= 1;
        self.prefix.push(*letter);
        self.depth += 1;
    }

    fn pop(&mut self, idx: usize) {
        self.prefix.pop();
        self.counts[idx].1 += 1;
        self.depth -= 1;
    }

    fn emit(&mut self) -> ControlFlow<Stop> {
        self.total_generated += 1;

        let complexity = self.scorer.score(&self.prefix);
        if let Some(filter) = self.filter {
            if !filter.contains(complexity) {
                return ControlFlow::Continue(());
            }
        }

        if self.combinations.len() >= self.max_combinations {
            return ControlFlow::Break(Stop::CapReached);
        }

        if let Err(used_bytes) = self.memory.reserve(entry_cost(&self.prefix)) {
            return ControlFlow::Break(Stop::MemoryExceeded {
                used_bytes,
                limit_bytes: self.memory.limit_bytes(),
            });
        }

        self.combinations
            .push(WordCombination::new(self.prefix.clone(), complexity));
        ControlFlow::Continue(())
    }
}
