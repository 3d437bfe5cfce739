// Decides whether a page's text is worth keeping

/// Pages with fewer alphanumeric tokens than this are treated as boilerplate.
pub const DEFAULT_MINIMUM_WORDS: usize = 200;

/// True once `text` has yielded `minimum_words` alphanumeric tokens.
///
/// Tokens are the pieces left after splitting on runs of non-alphanumeric
/// characters. Scanning stops at the threshold.
pub fn is_substantial(text: &str, minimum_words: usize) -> bool {
    if minimum_words == 0 {
        return true;
    }

    let mut count = 0;
    for _ in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
    {
        count += 1;
        if count >= minimum_words {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letters(n: usize) -> String {
        vec!["a"; n].join(" ")
    }

    #[test]
    fn test_threshold_boundary() {
        assert!(!is_substantial(&letters(199), DEFAULT_MINIMUM_WORDS));
        assert!(is_substantial(&letters(200), DEFAULT_MINIMUM_WORDS));
        assert!(is_substantial(&letters(201), DEFAULT_MINIMUM_WORDS));
    }

    #[test]
    fn test_punctuation_runs_split_tokens() {
        assert!(is_substantial("one,two;;three--four", 4));
        assert!(!is_substantial("one,two;;three--four", 5));
    }

    #[test]
    fn test_empty_and_symbol_only_text() {
        assert!(!is_substantial("", 1));
        assert!(!is_substantial("  --- ... !!! ", 1));
    }

    #[test]
    fn test_digits_count_as_tokens() {
        assert!(is_substantial("2024 cs 121", 3));
    }

    #[test]
    fn test_zero_threshold_always_passes() {
        assert!(is_substantial("", 0));
    }
}
