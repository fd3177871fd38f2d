//! Cache keys for generation requests

use sha2::{Digest, Sha256};
use wordforge_config::GenerationMode;

use crate::models::WordInput;

/// SHA-256 (hex) of the request's canonical form.
///
/// Letters are sorted and upper-cased, so any ordering or casing of the same
/// multiset of letters yields the same key.
pub fn fingerprint(input: &WordInput, mode: GenerationMode) -> String {
    let mut letters: Vec<char> = input
        .characters
        .chars()
        .flat_map(char::to_uppercase)
        .collect();
    letters.sort_unstable();
    let letters: String = letters.into_iter().collect();

    let filters = match input.filters {
        Some(f) => format!("{}-{}", f.min_complexity, f.max_complexity),
        None => "none".to_string(),
    };

    let mut hasher = Sha256::new();
    hasher.update(letters.as_bytes());
    hasher.update(b"|");
    hasher.update(input.language.to_ascii_lowercase().as_bytes());
    hasher.update(b"|");
    hasher.update(format!("{}..={}", input.min_length, input.max_length).as_bytes());
    hasher.update(b"|");
    hasher.update(filters.as_bytes());
    hasher.update(b"|");
    hasher.update(mode.as_str().as_bytes());

    format!("{:x}", hasher.finalize())
}
