use crate::error::{Result, SearchError};
use std::collections::BTreeSet;

/// Split text into space-delimited words. Runs of spaces never yield empty words.
pub fn split_into_words(text: &str) -> impl Iterator<Item = &str> + Clone {
    text.split(' ').filter(|word| !word.is_empty())
}

/// A word is valid when it holds no control characters.
pub fn is_valid_word(word: &str) -> bool {
    !word.chars().any(|c| c < ' ')
}

#[derive(Debug, Default, Clone)]
pub struct StopWords {
    words: BTreeSet<String>,
}

impl StopWords {
    /// Build from raw space-delimited text.
    pub fn from_text(text: &str) -> Result<Self> {
        Self::from_words(split_into_words(text))
    }

    /// Build from any collection of words. Empty entries are skipped.
    pub fn from_words<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for word in words {
            let word = word.as_ref();
            if word.is_empty() {
                continue;
            }
            if !is_valid_word(word) {
                return Err(SearchError::InvalidArgument(format!("stop word {word:?} is invalid")));
            }
            set.insert(word.to_string());
        }
        Ok(Self { words: set })
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
