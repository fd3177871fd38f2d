//! Property tests for normalization, scoring, enumeration and fingerprints

use std::collections::HashSet;

use proptest::prelude::*;
use wordforge_config::{GenerationMode, GenerationSettings};
use wordforge_engine::{
    fingerprint, CombinationGenerator, ComplexityScorer, InputNormalizer, RawWordInput,
};

fn small_settings(mode: GenerationMode) -> GenerationSettings {
    GenerationSettings {
        mode,
        max_combinations: 5_000,
        ..GenerationSettings::default()
    }
}

fn mode_strategy() -> impl Strategy<Value = GenerationMode> {
    prop_oneof![
        Just(GenerationMode::Permutations),
        Just(GenerationMode::Subsequences)
    ]
}

/// Letters plus a valid `(min, max)` length pair
fn request_strategy() -> impl Strategy<Value = (String, usize, usize)> {
    "[a-f]{2,6}".prop_flat_map(|letters| {
        let n = letters.len();
        (Just(letters), 1..=n).prop_flat_map(move |(letters, min)| (Just(letters), Just(min), min..=n))
    })
}

proptest! {
    #[test]
    fn prop_scores_are_whole_numbers_in_range(word in "[a-zA-Z]{0,30}") {
        let score = ComplexityScorer::default().score(&word);
        prop_assert!((1.0..=10.0).contains(&score));
        prop_assert_eq!(score.fract(), 0.0);
    }

    #[test]
    fn prop_repeating_a_letter_never_beats_distinct_letters(len in 2usize..=15) {
        let scorer = ComplexityScorer::default();
        let repeated = "a".repeat(len);
        let distinct: String = "abcdefghijklmno".chars().take(len).collect();
        prop_assert!(scorer.score(&repeated) <= scorer.score(&distinct));
    }

    #[test]
    fn prop_generated_words_respect_bounds(
        (letters, min, max) in request_strategy(),
        mode in mode_strategy(),
    ) {
        let normalizer = InputNormalizer::new(&small_settings(mode));
        let input = normalizer
            .normalize(&RawWordInput::new(letters.clone(), min as i64, max as i64))
            .unwrap();
        let result = CombinationGenerator::new(&small_settings(mode)).generate(&input).unwrap();

        let mut seen = HashSet::new();
        for combination in &result.combinations {
            let len = combination.word.chars().count();
            prop_assert!(len >= min && len <= max);
            prop_assert!((1.0..=10.0).contains(&combination.complexity));
            prop_assert_eq!(combination.complexity.fract(), 0.0);
            prop_assert!(seen.insert(combination.word.clone()), "duplicate {}", combination.word);
        }
        prop_assert!(result.combinations.len() <= 5_000);
        prop_assert!(result.total_generated >= result.combinations.len());
    }

    #[test]
    fn prop_fingerprint_ignores_order_and_case(
        letters in "[a-z]{2,15}",
        seed in any::<u64>(),
        mode in mode_strategy(),
    ) {
        let normalizer = InputNormalizer::new(&GenerationSettings::default());
        let n = letters.len() as i64;

        // Deterministic shuffle driven by the seed
        let mut shuffled: Vec<char> = letters.chars().collect();
        let mut state = seed | 1;
        for i in (1..shuffled.len()).rev() {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            shuffled.swap(i, (state % (i as u64 + 1)) as usize);
        }
        let shuffled: String = shuffled.into_iter().collect::<String>().to_uppercase();

        let a = normalizer.normalize(&RawWordInput::new(letters, 1, n)).unwrap();
        let b = normalizer.normalize(&RawWordInput::new(shuffled, 1, n)).unwrap();
        prop_assert_eq!(fingerprint(&a, mode), fingerprint(&b, mode));
    }

    #[test]
    fn prop_normalizer_accepts_only_valid_bounds(
        letters in "[a-z]{2,15}",
        min in -2i64..20,
        max in -2i64..20,
    ) {
        let normalizer = InputNormalizer::new(&GenerationSettings::default());
        let n = letters.len() as i64;
        let outcome = normalizer.normalize(&RawWordInput::new(letters, min, max));
        let expected_ok = min >= 1 && max <= n && min <= max;
        prop_assert_eq!(outcome.is_ok(), expected_ok);
    }
}
