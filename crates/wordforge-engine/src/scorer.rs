//! Word complexity scoring
//!
//! A score is built from three parts:
//!
//! 1. a length component `1 + 8 * (min(len, sat) / sat)^0.7` that flattens out
//!    as the word approaches the saturation length,
//! 2. a repetition penalty of `4 * marked / len`, where a position is marked when
//!    it repeats the previous letter or completes a tandem repeat
//!    (`s[i..i+w] == s[i+w..i+2w]`),
//! 3. a diversity bonus of the vowel/consonant alternation ratio plus half the
//!    distinct-letter ratio.
//!
//! The sum is rounded and clamped to `1..=10`.

pub const MIN_SCORE: f64 = 1.0;
pub const MAX_SCORE: f64 = 10.0;

const LENGTH_SPAN: f64 = 8.0;
const LENGTH_EXPONENT: f64 = 0.7;
const REPETITION_WEIGHT: f64 = 4.0;
const ALTERNATION_WEIGHT: f64 = 1.0;
const DISTINCT_WEIGHT: f64 = 0.5;

/// Pure, case-insensitive complexity scorer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComplexityScorer {
    saturation_length: usize,
}

impl Default for ComplexityScorer {
    fn default() -> Self {
        Self::new(15)
    }
}

impl ComplexityScorer {
    pub fn new(saturation_length: usize) -> Self {
        Self {
            saturation_length: saturation_length.max(1),
        }
    }

    pub fn saturation_length(&self) -> usize {
        self.saturation_length
    }

    /// Whole-number score in `1..=10`
    pub fn score(&self, word: &str) -> f64 {
        let letters: Vec<char> = word.chars().flat_map(char::to_lowercase).collect();
        if letters.is_empty() {
            return MIN_SCORE;
        }

        let raw = self.length_score(letters.len()) - repetition_penalty(&letters)
            + diversity_bonus(&letters);
        raw.round().clamp(MIN_SCORE, MAX_SCORE)
    }

    fn length_score(&self, len: usize) -> f64 {
        let ratio = len.min(self.saturation_length) as f64 / self.saturation_length as f64;
        MIN_SCORE + LENGTH_SPAN * ratio.powf(LENGTH_EXPONENT)
    }
}

fn repetition_penalty(letters: &[char]) -> f64 {
    let len = letters.len();
    let mut marked = vec![false; len];

    for j in 1..len {
        if letters[j] == letters[j - 1] {
            marked[j] = true;
        }
    }

    for width in 2..=len / 2 {
        for start in 0..=len - 2 * width {
            let (first, second) = (start..start + width, start + width..start + 2 * width);
            if letters[first] == letters[second.clone()] {
                marked[second].iter_mut().for_each(|m| *m = true);
            }
        }
    }

    let count = marked.iter().filter(|m| **m).count();
    REPETITION_WEIGHT * count as f64 / len as f64
}

fn diversity_bonus(letters: &[char]) -> f64 {
    let len = letters.len();

    let alternation = if len < 2 {
        0.0
    } else {
        let switches = letters
            .windows(2)
            .filter(|pair| is_vowel(pair[0]) != is_vowel(pair[1]))
            .count();
        switches as f64 / (len - 1) as f64
    };

    let mut distinct = letters.to_vec();
    distinct.sort_unstable();
    distinct.dedup();
    let distinct_ratio = distinct.len() as f64 / len as f64;

    ALTERNATION_WEIGHT * alternation + DISTINCT_WEIGHT * distinct_ratio
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}
