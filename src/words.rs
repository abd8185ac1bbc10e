//! Categorised word lists
//!
//! Every `*.txt` file in the word directory is one category (keyed by its
//! file stem) holding comma-separated phrases. The lists are read once into
//! an immutable [`WordBank`] that the prompt synthesizer samples from.

use crate::Result;
use rand::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

pub const ANIMALS: &str = "animals";
pub const ADJECTIVES: &str = "adjectives";
pub const SYMBOLISM: &str = "symbolism";
pub const GENERAL_STYLE: &str = "general_style";

const WORD_FILE_EXTENSION: &str = "txt";

/// Immutable snapshot of every word category.
#[derive(Debug, Clone, Default)]
pub struct WordBank {
    categories: BTreeMap<String, Vec<String>>,
}

/// Split a word file's contents into trimmed, non-empty phrases.
pub fn parse_word_list(contents: &str) -> Vec<String> {
    contents
        .split(',')
        .map(str::trim)
        .filter(|phrase| !phrase.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read a single comma-separated word file.
pub fn load_word_list(path: &Path) -> Result<Vec<String>> {
    Ok(parse_word_list(&fs::read_to_string(path)?))
}

impl WordBank {
    /// Load every `*.txt` category from `dir`.
    ///
    /// Returns `Ok(None)` when the directory does not exist. A file that
    /// cannot be read is kept as an empty category so callers fall back to
    /// their defaults instead of failing.
    pub fn from_dir(dir: &Path) -> Result<Option<Self>> {
        if !dir.is_dir() {
            warn!("Word directory {} not found", dir.display());
            return Ok(None);
        }

        let mut categories = BTreeMap::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(WORD_FILE_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };

            let phrases = load_word_list(&path).unwrap_or_else(|e| {
                warn!("Error reading {}: {}", path.display(), e);
                Vec::new()
            });
            debug!("Loaded {} phrases for category '{}'", phrases.len(), stem);
            categories.insert(stem.to_string(), phrases);
        }

        Ok(Some(Self { categories }))
    }

    /// Build a bank from in-memory lists.
    pub fn from_categories<I, K, V>(categories: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        Self {
            categories: categories
                .into_iter()
                .map(|(name, phrases)| {
                    let phrases = phrases
                        .into_iter()
                        .map(Into::into)
                        .map(|phrase: String| phrase.trim().to_string())
                        .filter(|phrase| !phrase.is_empty())
                        .collect();
                    (name.into(), phrases)
                })
                .collect(),
        }
    }

    /// Pick one phrase from `category`, with replacement.
    pub fn sample(&self, category: &str, rng: &mut impl Rng) -> Option<&str> {
        self.categories
            .get(category)
            .and_then(|phrases| phrases.choose(rng))
            .map(String::as_str)
    }

    /// Category names in sorted order.
    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn phrases(&self, category: &str) -> &[String] {
        self.categories
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
