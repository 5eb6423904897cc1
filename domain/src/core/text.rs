//! Text matching helpers used by shift alignment, success predicates and the
//! communication rubric.
//!
//! All matching is case-insensitive and phrase based. Nothing here tries to
//! understand language; packs declare the phrases that count.

/// Truncate a string to a maximum length with ellipsis (UTF-8 safe)
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let target = max_len.saturating_sub(3);
        let mut end = target.min(s.len());
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

/// Case-insensitive substring check
pub fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    let phrase = phrase.trim();
    if phrase.is_empty() {
        return false;
    }
    haystack.to_lowercase().contains(&phrase.to_lowercase())
}

/// True when at least one phrase occurs in `haystack`
pub fn contains_any<S: AsRef<str>>(haystack: &str, phrases: &[S]) -> bool {
    let lowered = haystack.to_lowercase();
    phrases.iter().any(|p| {
        let p = p.as_ref().trim().to_lowercase();
        !p.is_empty() && lowered.contains(&p)
    })
}

/// True when every phrase occurs in `haystack`. An empty phrase list never matches.
pub fn contains_all<S: AsRef<str>>(haystack: &str, phrases: &[S]) -> bool {
    if phrases.is_empty() {
        return false;
    }
    let lowered = haystack.to_lowercase();
    phrases
        .iter()
        .all(|p| lowered.contains(&p.as_ref().trim().to_lowercase()))
}

/// True when some sentence of `haystack` opens with one of `phrases` as
/// whole words ("Sure, ..." matches `sure`; "I'm not sure" does not)
pub fn opens_with_any<S: AsRef<str>>(haystack: &str, phrases: &[S]) -> bool {
    let lowered = haystack.to_lowercase();
    let sentences: Vec<&str> = lowered
        .split(['.', '!', '?', ';', '\n'])
        .map(str::trim_start)
        .collect();
    phrases.iter().any(|p| {
        let p = p.as_ref().trim().to_lowercase();
        !p.is_empty()
            && sentences.iter().any(|sentence| {
                sentence
                    .strip_prefix(p.as_str())
                    .is_some_and(|rest| !rest.starts_with(|c: char| c.is_alphanumeric()))
            })
    })
}

/// Turn a category identifier like `course_registration` into `course registration`
pub fn humanize(identifier: &str) -> String {
    identifier.replace(['_', '-'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("あのねあのね", 7), "あ...");
    }

    #[test]
    fn test_contains_phrase_ignores_case() {
        assert!(contains_phrase("I have REGISTERED you", "registered"));
        assert!(!contains_phrase("anything", "  "));
    }

    #[test]
    fn test_opens_with_any_needs_sentence_start_and_word_boundary() {
        let phrases = ["sure", "of course"];
        assert!(opens_with_any("Sure, one moment.", &phrases));
        assert!(opens_with_any("Thanks for waiting. Of course I can do that.", &phrases));
        assert!(!opens_with_any("I'm not sure we can do that.", &phrases));
        assert!(!opens_with_any("Surely that is done.", &phrases));
        assert!(!opens_with_any("anything", &["  "]));
    }

    #[test]
    fn test_contains_any_and_all() {
        let text = "Your transfer to savings is scheduled";
        assert!(contains_any(text, &["loan", "Savings"]));
        assert!(!contains_any(text, &["loan", "card"]));
        assert!(contains_all(text, &["transfer", "savings"]));
        assert!(!contains_all(text, &["transfer", "loan"]));
        assert!(!contains_all::<&str>(text, &[]));
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("course_registration"), "course registration");
        assert_eq!(humanize("card-replacement"), "card replacement");
    }
}
