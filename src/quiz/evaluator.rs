//! Answer matching

/// Whether the transcript contains the expected answer
///
/// Case-insensitive substring match, so filler words are fine:
/// "it's a cow" answers "COW".
pub fn is_correct(transcript: &str, expected: &str) -> bool {
    transcript
        .to_lowercase()
        .contains(&expected.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filler_words() {
        assert!(is_correct("it's a cow", "COW"));
        assert!(is_correct("Cow", "cow"));
        assert!(is_correct("I think it is a LION!", "lion"));
    }

    #[test]
    fn test_wrong_answers() {
        assert!(!is_correct("tiger", "lion"));
        assert!(!is_correct("", "cat"));
        // No fuzzy or phonetic matching
        assert!(!is_correct("kat", "cat"));
    }

    #[test]
    fn test_substring_not_word() {
        // Plain containment, not word matching
        assert!(is_correct("category", "cat"));
    }

    #[test]
    fn test_matches_lowercase_contains() {
        let cases = [
            ("Elephants!", "elephants"),
            ("three birds", "THREE"),
            ("paris france", "Paris"),
            ("saturn's rings", "saturn"),
            ("winter", "summer"),
            ("", ""),
        ];
        for (transcript, expected) in cases {
            assert_eq!(
                is_correct(transcript, expected),
                transcript.to_lowercase().contains(&expected.to_lowercase())
            );
        }
    }
}
