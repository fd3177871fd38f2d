//! In-memory word list dictionary

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{DictionaryEntry, DictionaryError, DictionarySource};

/// Word lists keyed by language code.
///
/// Lookups are case-insensitive. A language with no list loaded answers every
/// word as not found.
#[derive(Debug, Clone, Default)]
pub struct WordListDictionary {
    name: String,
    languages: HashMap<String, HashMap<String, Option<String>>>,
}

impl WordListDictionary {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            languages: HashMap::new(),
        }
    }

    /// Add words without definitions
    pub fn with_words<I, S>(mut self, language: &str, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            self.insert(language, word.as_ref(), None);
        }
        self
    }

    pub fn insert(&mut self, language: &str, word: &str, definition: Option<String>) {
        let word = word.trim();
        if word.is_empty() {
            return;
        }
        self.languages
            .entry(language.to_ascii_lowercase())
            .or_default()
            .insert(word.to_uppercase(), definition);
    }

    /// Load words from text, one per line.
    ///
    /// A line may carry a definition after a tab. Blank lines and lines starting
    /// with `#` are skipped.
    pub fn load_str(&mut self, language: &str, contents: &str) -> usize {
        let mut loaded = 0;
        for line in contents.lines() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.trim_start().starts_with('#') {
                continue;
            }
            let (word, definition) = match line.split_once('\t') {
                Some((word, definition)) => {
                    let definition = definition.trim();
                    (
                        word,
                        (!definition.is_empty()).then(|| definition.to_string()),
                    )
                }
                None => (line, None),
            };
            self.insert(language, word, definition);
            loaded += 1;
        }
        loaded
    }

    /// Load a word list file for `language`
    pub fn load_file(&mut self, language: &str, path: impl AsRef<Path>) -> Result<usize, DictionaryError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let loaded = self.load_str(language, &contents);
        info!(path = %path.display(), language, loaded, "Loaded word list");
        Ok(loaded)
    }

    pub fn from_file(
        name: impl Into<String>,
        language: &str,
        path: impl AsRef<Path>,
    ) -> Result<Self, DictionaryError> {
        let mut dictionary = Self::new(name);
        dictionary.load_file(language, path)?;
        Ok(dictionary)
    }

    pub fn contains(&self, language: &str, word: &str) -> bool {
        self.languages
            .get(&language.to_ascii_lowercase())
            .map(|words| words.contains_key(&word.to_uppercase()))
            .unwrap_or(false)
    }

    /// Number of words loaded for `language`
    pub fn len(&self, language: &str) -> usize {
        self.languages
            .get(&language.to_ascii_lowercase())
            .map(HashMap::len)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.languages.values().all(HashMap::is_empty)
    }
}

#[async_trait]
impl DictionarySource for WordListDictionary {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(
        &self,
        words: &[String],
        language: &str,
    ) -> Result<Vec<DictionaryEntry>, DictionaryError> {
        let Some(list) = self.languages.get(&language.to_ascii_lowercase()) else {
            debug!(language, "No word list loaded for language");
            return Ok(words.iter().map(DictionaryEntry::invalid).collect());
        };

        Ok(words
            .iter()
            .map(|word| match list.get(&word.to_uppercase()) {
                Some(definition) => DictionaryEntry::valid(word, definition.clone()),
                None => DictionaryEntry::invalid(word),
            })
            .collect())
    }
}
