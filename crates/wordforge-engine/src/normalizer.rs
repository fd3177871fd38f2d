//! Request-boundary validation and canonicalization

use std::collections::BTreeSet;

use wordforge_config::GenerationSettings;

use crate::error::{EngineError, Result};
use crate::models::{ComplexityFilter, RawWordInput, WordInput};

pub const DEFAULT_LANGUAGE: &str = "en";

/// Turns a [`RawWordInput`] into a [`WordInput`] or rejects it.
///
/// Whitespace is always dropped and letters are upper-cased. Characters outside
/// the alphabet are rejected in strict mode and silently removed otherwise.
#[derive(Debug, Clone)]
pub struct InputNormalizer {
    alphabet: BTreeSet<char>,
    min_characters: usize,
    max_characters: usize,
    strict: bool,
}

impl InputNormalizer {
    pub fn new(settings: &GenerationSettings) -> Self {
        Self {
            alphabet: settings
                .alphabet
                .chars()
                .flat_map(char::to_uppercase)
                .collect(),
            min_characters: settings.min_characters,
            max_characters: settings.max_characters,
            strict: settings.strict,
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn normalize(&self, raw: &RawWordInput) -> Result<WordInput> {
        let text = string_like(&raw.characters)?;
        let characters = self.clean(&text)?;

        let count = characters.chars().count();
        if count < self.min_characters || count > self.max_characters {
            return Err(EngineError::InvalidInput(format!(
                "characters must contain between {} and {} letters, got {}",
                self.min_characters, self.max_characters, count
            )));
        }

        let (min_length, max_length) = length_bounds(raw.min_length, raw.max_length, count)?;
        let language = normalize_language(raw.language.as_deref())?;
        let filters = raw
            .filters
            .map(|f| ComplexityFilter::new(f.min_complexity, f.max_complexity))
            .transpose()?;

        Ok(WordInput {
            characters,
            language,
            min_length,
            max_length,
            filters,
        })
    }

    fn clean(&self, text: &str) -> Result<String> {
        let mut cleaned = String::with_capacity(text.len());
        for c in text.chars() {
            if c.is_whitespace() {
                continue;
            }
            let upper: Vec<char> = c.to_uppercase().collect();
            if upper.iter().all(|u| self.alphabet.contains(u)) {
                cleaned.extend(upper);
            } else if self.strict {
                return Err(EngineError::InvalidInput(format!(
                    "character '{}' is not a letter of the configured alphabet",
                    c
                )));
            }
        }
        Ok(cleaned)
    }
}

fn string_like(value: &serde_json::Value) -> Result<String> {
    match value {
        serde_json::Value::String(s) => Ok(s.clone()),
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| match item {
                serde_json::Value::String(s) => Ok(s.as_str()),
                _ => Err(EngineError::InvalidInput(
                    "characters array must only contain strings".to_string(),
                )),
            })
            .collect::<Result<Vec<_>>>()
            .map(|parts| parts.concat()),
        other => Err(EngineError::InvalidInput(format!(
            "characters must be a string, got {}",
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

fn length_bounds(min_length: i64, max_length: i64, count: usize) -> Result<(usize, usize)> {
    let upper = count as i64;
    if min_length < 1 || min_length > upper {
        return Err(EngineError::InvalidInput(format!(
            "minLength must be between 1 and {}, got {}",
            upper, min_length
        )));
    }
    if max_length < 1 || max_length > upper {
        return Err(EngineError::InvalidInput(format!(
            "maxLength must be between 1 and {}, got {}",
            upper, max_length
        )));
    }
    if min_length > max_length {
        return Err(EngineError::InvalidInput(format!(
            "minLength {} is greater than maxLength {}",
            min_length, max_length
        )));
    }
    Ok((min_length as usize, max_length as usize))
}

/// Lower-cases a BCP 47 style code such as `en` or `pt-BR`; empty means the default
fn normalize_language(language: Option<&str>) -> Result<String> {
    let code = match language.map(str::trim) {
        None | Some("") => return Ok(DEFAULT_LANGUAGE.to_string()),
        Some(code) => code.replace('_', "-").to_ascii_lowercase(),
    };

    let mut parts = code.split('-');
    let primary_ok = parts
        .next()
        .map(|p| (2..=3).contains(&p.len()) && p.chars().all(|c| c.is_ascii_lowercase()))
        .unwrap_or(false);
    let subtags_ok = parts.all(|p| (2..=8).contains(&p.len()) && p.chars().all(|c| c.is_ascii_alphanumeric()));

    if primary_ok && subtags_ok {
        Ok(code)
    } else {
        Err(EngineError::InvalidInput(format!(
            "malformed language code: {}",
            code
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> InputNormalizer {
        InputNormalizer::new(&GenerationSettings::default())
    }

    fn lenient() -> InputNormalizer {
        InputNormalizer::new(&GenerationSettings {
            strict: false,
            ..GenerationSettings::default()
        })
    }

    #[test]
    fn test_uppercases_and_strips_whitespace() {
        let input = normalizer()
            .normalize(&RawWordInput::new(" c a\tt ", 1, 3))
            .unwrap();
        assert_eq!(input.characters, "CAT");
        assert_eq!(input.language, "en");
        assert_eq!((input.min_length, input.max_length), (1, 3));
        assert_eq!(input.filters, None);
    }

    #[test]
    fn test_strict_mode_rejects_symbols_and_digits() {
        let err = normalizer()
            .normalize(&RawWordInput::new("test123!@#", 2, 4))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn test_lenient_mode_strips_symbols_and_digits() {
        let input = lenient()
            .normalize(&RawWordInput::new("test123!@#", 2, 4))
            .unwrap();
        assert_eq!(input.characters, "TEST");
    }

    #[test]
    fn test_array_of_strings_is_joined() {
        let raw = RawWordInput {
            characters: serde_json::json!(["d", "o", "g"]),
            ..RawWordInput::new("", 1, 3)
        };
        assert_eq!(normalizer().normalize(&raw).unwrap().characters, "DOG");
    }

    #[test]
    fn test_non_string_characters_rejected() {
        for characters in [
            serde_json::json!(42),
            serde_json::json!(null),
            serde_json::json!({"a": 1}),
            serde_json::json!(["a", 1]),
        ] {
            let raw = RawWordInput {
                characters,
                ..RawWordInput::new("", 1, 2)
            };
            assert!(normalizer().normalize(&raw).is_err());
        }
    }

    #[test]
    fn test_letter_count_bounds() {
        assert!(normalizer().normalize(&RawWordInput::new("a", 1, 1)).is_err());
        assert!(normalizer().normalize(&RawWordInput::new("ab", 1, 2)).is_ok());
        assert!(normalizer()
            .normalize(&RawWordInput::new("abcdefghijklmno", 1, 5))
            .is_ok());
        assert!(normalizer()
            .normalize(&RawWordInput::new("abcdefghijklmnop", 1, 5))
            .is_err());
    }

    #[test]
    fn test_length_bounds() {
        let n = normalizer();
        assert!(n.normalize(&RawWordInput::new("abcd", 0, 2)).is_err());
        assert!(n.normalize(&RawWordInput::new("abcd", 1, 5)).is_err());
        assert!(n.normalize(&RawWordInput::new("abcd", 3, 2)).is_err());
        assert!(n.normalize(&RawWordInput::new("abcd", -1, 2)).is_err());
        assert!(n.normalize(&RawWordInput::new("abcd", 4, 4)).is_ok());
    }

    #[test]
    fn test_filters_validated() {
        let n = normalizer();
        let ok = n
            .normalize(&RawWordInput::new("abcd", 1, 4).with_filters(2, 6))
            .unwrap();
        assert_eq!(
            ok.filters,
            Some(ComplexityFilter {
                min_complexity: 2,
                max_complexity: 6
            })
        );
        assert!(n
            .normalize(&RawWordInput::new("abcd", 1, 4).with_filters(6, 2))
            .is_err());
        assert!(n
            .normalize(&RawWordInput::new("abcd", 1, 4).with_filters(0, 2))
            .is_err());
    }

    #[test]
    fn test_language_codes() {
        let n = normalizer();
        let lang = |code: &str| {
            n.normalize(&RawWordInput::new("abcd", 1, 4).with_language(code))
                .map(|i| i.language)
        };
        assert_eq!(lang("EN").unwrap(), "en");
        assert_eq!(lang("pt_BR").unwrap(), "pt-br");
        assert_eq!(lang("  ").unwrap(), "en");
        assert!(lang("e").is_err());
        assert!(lang("english").is_err());
        assert!(lang("en-").is_err());
        assert!(lang("e1").is_err());
    }

    #[test]
    fn test_custom_alphabet() {
        let n = InputNormalizer::new(&GenerationSettings {
            alphabet: "abc".to_string(),
            ..GenerationSettings::default()
        });
        assert_eq!(
            n.normalize(&RawWordInput::new("cab", 1, 3)).unwrap().characters,
            "CAB"
        );
        assert!(n.normalize(&RawWordInput::new("cad", 1, 3)).is_err());
    }
}
