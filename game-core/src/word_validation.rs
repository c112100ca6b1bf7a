use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;

/// Decides whether a submitted string is a real word.
pub trait WordDictionary: Send + Sync {
    fn is_valid_word(&self, word: &str) -> bool;
}

pub struct WordValidator {
    valid_words: HashSet<String>,
}

impl WordValidator {
    /// Create a new word validator from a newline separated word list.
    /// Blank lines and lines starting with `#` are skipped.
    pub fn from_word_list(word_list: &str) -> Self {
        let valid_words = word_list
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_lowercase)
            .filter(|word| is_alphabetic(word))
            .collect();

        Self { valid_words }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read word list {}", path.display()))?;
        let validator = Self::from_word_list(&contents);
        tracing::info!(
            words = validator.len(),
            path = %path.display(),
            "loaded word list"
        );
        Ok(validator)
    }

    pub fn len(&self) -> usize {
        self.valid_words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valid_words.is_empty()
    }
}

impl WordDictionary for WordValidator {
    fn is_valid_word(&self, word: &str) -> bool {
        let word = word.trim().to_lowercase();
        is_alphabetic(&word) && self.valid_words.contains(&word)
    }
}

fn is_alphabetic(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| c.is_alphabetic())
}
