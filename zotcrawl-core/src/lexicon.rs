use crate::error::{CoreError, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Stop-word list installed by `zotcrawl init`.
pub const DEFAULT_STOP_WORDS: &str = include_str!("../stopwords/default.txt");

/// Decides whether a token is a recognizable English word.
pub trait Lexicon: Send + Sync {
    fn is_word(&self, token: &str) -> bool;
}

/// Newline-delimited dictionary, e.g. `/usr/share/dict/words`.
/// Lookups are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct WordList {
    words: HashSet<String>,
}

impl WordList {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::missing("dictionary", path));
        }
        let content = fs::read_to_string(path)?;
        Ok(Self::from_words(content.lines()))
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Lexicon for WordList {
    fn is_word(&self, token: &str) -> bool {
        self.words.contains(&token.to_lowercase())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::missing("stop-word list", path));
        }
        let content = fs::read_to_string(path)?;
        Ok(Self::from_words(content.lines()))
    }

    pub fn bundled() -> Self {
        Self::from_words(DEFAULT_STOP_WORDS.lines())
    }

    /// Entries keep their case; only trailing whitespace is removed.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim_end().to_string())
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_list_case_insensitive() {
        let list = WordList::from_words(["Crawler", "domain", ""]);
        assert_eq!(list.len(), 2);
        assert!(list.is_word("crawler"));
        assert!(list.is_word("DOMAIN"));
        assert!(!list.is_word("xk9q"));
    }

    #[test]
    fn test_bundled_stop_words() {
        let stop = StopWords::bundled();
        assert!(stop.contains("the"));
        assert!(stop.contains("don't"));
        assert!(!stop.contains("crawler"));
    }

    #[test]
    fn test_missing_files() {
        let path = Path::new("/nonexistent/zotcrawl/words");
        assert!(matches!(
            WordList::load(path),
            Err(CoreError::MissingResource { kind: "dictionary", .. })
        ));
        assert!(matches!(
            StopWords::load(path),
            Err(CoreError::MissingResource { kind: "stop-word list", .. })
        ));
    }
}
