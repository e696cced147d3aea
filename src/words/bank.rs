use rand::seq::IndexedRandom;
use rand::Rng;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

use super::catalog::CATEGORIES;
use crate::error::WordBankError;

/// Category -> word table the secret words are drawn from.
///
/// The bank is read-only after construction and shared between sessions
/// behind an `Arc`.
#[derive(Debug, Clone)]
pub struct WordBank {
    categories: BTreeMap<String, Vec<String>>,
}

impl Default for WordBank {
    fn default() -> Self {
        Self::builtin()
    }
}

impl WordBank {
    /// The built-in word table
    pub fn builtin() -> Self {
        let categories = CATEGORIES
            .iter()
            .map(|(name, words)| {
                let words = words.iter().map(|w| w.to_string()).collect();
                (name.to_string(), words)
            })
            .collect();

        Self { categories }
    }

    /// Build a bank from an in-memory table. Words are trimmed and lower-cased,
    /// blank entries and empty categories are dropped.
    pub fn from_categories(table: BTreeMap<String, Vec<String>>) -> Result<Self, WordBankError> {
        let categories: BTreeMap<String, Vec<String>> = table
            .into_iter()
            .map(|(name, words)| {
                let words: Vec<String> = words
                    .iter()
                    .map(|w| w.trim().to_lowercase())
                    .filter(|w| !w.is_empty())
                    .collect();
                (name.trim().to_string(), words)
            })
            .filter(|(_, words)| !words.is_empty())
            .collect();

        if categories.is_empty() {
            return Err(WordBankError::EmptyCategory);
        }

        Ok(Self { categories })
    }

    /// Load a word list from a JSON file shaped like
    /// `{ "Animals": ["dog", "cat"], "Food": ["pizza"] }`.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, WordBankError> {
        let path = path.as_ref();
        info!("Loading word list from {}", path.display());

        let file = File::open(path)?;
        let table: BTreeMap<String, Vec<String>> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| WordBankError::FormatError(e.to_string()))?;

        let bank = Self::from_categories(table)?;
        info!(
            "Loaded {} words in {} categories",
            bank.len(),
            bank.categories.len()
        );
        Ok(bank)
    }

    /// Names of all categories, sorted
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    /// Total number of words across all categories
    pub fn len(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, word: &str) -> bool {
        let word = word.trim().to_lowercase();
        self.categories.values().any(|words| words.contains(&word))
    }

    /// Draw a uniformly random word using the thread-local RNG
    pub fn random_word(&self, category: Option<&str>) -> Result<String, WordBankError> {
        self.random_word_with(&mut rand::rng(), category)
    }

    /// Draw a uniformly random word from `category`, or from every category
    /// when none is given. Unknown categories fall back to the full table.
    pub fn random_word_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        category: Option<&str>,
    ) -> Result<String, WordBankError> {
        let selected = category.and_then(|name| self.categories.get(name));

        let word = match selected {
            Some(words) => words.choose(rng),
            None => {
                if let Some(name) = category {
                    debug!("Unknown word category '{}', drawing from all words", name);
                }
                let all: Vec<&String> = self.categories.values().flatten().collect();
                all.choose(rng).copied()
            }
        };

        word.cloned().ok_or(WordBankError::EmptyCategory)
    }
}
